// SPDX-License-Identifier: GPL-3.0-only

use enumflags2::BitFlags;
use storage_contracts::BoardSupport;
use storage_sys::detect_board;
use storage_types::{BoardVariant, Capability, FilesystemKind, PlatformConfig, Slot};

use crate::registry::{Disposal, Registry};

/// Owns every piece of state the storage operations touch: the board
/// drivers, both slot bindings, the cached board variant and the hot-plug
/// registration flag.
pub struct StorageContext<B: BoardSupport> {
    pub(crate) board: B,
    pub(crate) config: PlatformConfig,
    pub(crate) capabilities: BitFlags<Capability>,
    pub(crate) registry: Registry<B>,
    pub(crate) board_variant: Option<BoardVariant>,
    pub(crate) hotplug_registered: bool,
}

impl<B: BoardSupport> StorageContext<B> {
    pub fn new(board: B, config: PlatformConfig) -> Self {
        let capabilities = config.capabilities();
        tracing::debug!("Storage context created with capabilities {:?}", capabilities);

        Self {
            board,
            config,
            capabilities,
            registry: Registry::default(),
            board_variant: None,
            hotplug_registered: false,
        }
    }

    pub fn config(&self) -> &PlatformConfig {
        &self.config
    }

    pub fn capabilities(&self) -> BitFlags<Capability> {
        self.capabilities
    }

    pub fn board(&self) -> &B {
        &self.board
    }

    pub fn registry(&self) -> &Registry<B> {
        &self.registry
    }

    /// Variant established by the first mount or format, if any ran yet.
    pub fn board_variant(&self) -> Option<BoardVariant> {
        self.board_variant
    }

    pub fn hotplug_registered(&self) -> bool {
        self.hotplug_registered
    }

    pub fn has_device(&self, slot: Slot) -> bool {
        self.registry.has_device(slot)
    }

    pub fn is_mounted(&self, slot: Slot) -> bool {
        self.registry.is_mounted(slot)
    }

    pub fn mounted_kind(&self, slot: Slot) -> Option<FilesystemKind> {
        self.registry.volume_kind(slot)
    }

    /// Probe the board once per context lifetime.
    pub(crate) fn ensure_board_detected(&mut self) -> BoardVariant {
        if let Some(variant) = self.board_variant {
            return variant;
        }

        let variant = detect_board(&self.config, self.board.probe_hardware());
        self.board_variant = Some(variant);
        variant
    }

    pub(crate) fn variant(&self) -> BoardVariant {
        self.board_variant.unwrap_or_default()
    }

    pub(crate) fn teardown_allowed(&self, slot: Slot) -> bool {
        match slot {
            Slot::SdCard => true,
            Slot::Usb => self.capabilities.contains(Capability::SafeUsbTeardown),
        }
    }

    /// Apply the disposal rule to a slot whose volume is gone.
    pub(crate) fn dispose(&mut self, slot: Slot) -> Disposal {
        let teardown = self.teardown_allowed(slot);
        let disposal = match slot {
            Slot::SdCard => self.registry.sd.dispose_device(teardown),
            Slot::Usb => self.registry.usb.dispose_device(teardown),
        };

        if disposal == Disposal::Retained {
            tracing::debug!("Keeping {} device object for reuse", slot);
        }
        disposal
    }
}
