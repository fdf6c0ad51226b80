// SPDX-License-Identifier: GPL-3.0-only

//! Mount and format orchestration
//!
//! Every call follows the same shape: detect the board once, bind a device
//! to the slot, create a fresh volume, run the driver action and then settle
//! ownership. A failure at any step leaves the slot exactly as the binder
//! found it, minus any device the binder created for this call.

use storage_contracts::{BlockDevice, BoardSupport, StorageError, StorageErrorKind};
use storage_sys::translate;
use storage_types::{Action, FilesystemKind, MountFlags, Slot};

use crate::binder::Retention;
use crate::context::StorageContext;
use crate::registry::{Disposal, SlotBinding, Volume};

/// State a slot is left in after a successful format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatOutcome {
    /// The fresh volume was unmounted again and the device disposed.
    Unmounted(Disposal),
    /// The driver refused the follow-up unmount. The new volume stays
    /// mounted and bound to the slot.
    LeftMounted,
}

/// Where the volume ended up after a successful driver action
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Applied {
    /// Mounted and bound to the slot
    Bound,
    /// Unmounted again and dropped; the device is still bound.
    Released,
}

fn check(status: i32, what: &str) -> Result<(), StorageError> {
    translate(status)
        .map_err(|kind| StorageError::new(kind, format!("{what} failed with status {status}")))
}

/// Create a volume and run `action` against the slot's device.
///
/// On success after a mount the volume is left in `binding`. After a format
/// it is left there only if the follow-up unmount failed.
fn apply_action<B, D>(
    board: &mut B,
    binding: &mut SlotBinding<D, B>,
    kind: FilesystemKind,
    mount_point: &str,
    action: Action,
) -> Result<Applied, StorageError>
where
    B: BoardSupport,
    D: BlockDevice,
{
    let Some(mut volume) = Volume::<B>::create(board, kind, mount_point) else {
        return Err(StorageError::new(
            StorageErrorKind::NoSuchDevice,
            format!("failed to allocate {kind} driver for '{mount_point}'"),
        ));
    };

    let Some(device) = binding.device.as_mut() else {
        return Err(StorageError::new(
            StorageErrorKind::BadAddress,
            "no block device bound to the slot",
        ));
    };

    match action {
        Action::Mount => {
            check(volume.mount(device), "mount")?;
            binding.volume = Some(volume);
            Ok(Applied::Bound)
        }
        Action::Format => {
            check(volume.reformat(device), "reformat")?;

            let status = volume.unmount();
            if status != 0 {
                tracing::warn!(
                    "Unmount after formatting '{}' failed with status {}; volume left mounted",
                    mount_point,
                    status
                );
                binding.volume = Some(volume);
                return Ok(Applied::Bound);
            }
            Ok(Applied::Released)
        }
    }
}

impl<B: BoardSupport> StorageContext<B> {
    /// Mount `kind` on the slot. Only [`MountFlags::Default`] is accepted.
    pub fn mount(
        &mut self,
        slot: Slot,
        kind: FilesystemKind,
        flags: MountFlags,
    ) -> Result<(), StorageError> {
        if flags != MountFlags::Default {
            return Err(StorageError::new(
                StorageErrorKind::NotSupported,
                format!("mount flag {flags:?} is not supported"),
            ));
        }

        self.mount_or_format(slot, kind, Action::Mount)?;
        tracing::info!("Mounted {} on /{}", kind, self.config.mount_point(slot));
        Ok(())
    }

    /// Create a fresh `kind` filesystem on the slot's medium.
    ///
    /// The slot is expected to be unmounted. On success the new volume is
    /// normally unmounted again; see [`FormatOutcome`].
    pub fn format(
        &mut self,
        slot: Slot,
        kind: FilesystemKind,
    ) -> Result<FormatOutcome, StorageError> {
        let outcome = match self.mount_or_format(slot, kind, Action::Format)? {
            Applied::Released => FormatOutcome::Unmounted(self.dispose(slot)),
            Applied::Bound => FormatOutcome::LeftMounted,
        };

        tracing::info!("Formatted {} as {}", slot, kind);
        Ok(outcome)
    }

    /// Unmount the slot's volume and dispose of its device.
    ///
    /// A failed driver unmount leaves the binding untouched.
    pub fn unmount(&mut self, slot: Slot) -> Result<Disposal, StorageError> {
        let status = match slot {
            Slot::SdCard => Self::unmount_binding(&mut self.registry.sd),
            Slot::Usb => Self::unmount_binding(&mut self.registry.usb),
        }
        .map_err(|kind| {
            StorageError::new(kind, format!("{slot} is not mounted"))
        })?;

        check(status, "unmount")?;

        let disposal = self.dispose(slot);
        tracing::info!("Unmounted {}", slot);
        Ok(disposal)
    }

    fn unmount_binding<D>(binding: &mut SlotBinding<D, B>) -> Result<i32, StorageErrorKind> {
        match (binding.device.as_ref(), binding.volume.as_mut()) {
            (Some(_), Some(volume)) => Ok(volume.unmount()),
            _ => Err(StorageErrorKind::InvalidArgument),
        }
    }

    fn mount_or_format(
        &mut self,
        slot: Slot,
        kind: FilesystemKind,
        action: Action,
    ) -> Result<Applied, StorageError> {
        if self.config.mount_point(slot).is_empty() {
            return Err(StorageError::new(
                StorageErrorKind::BadAddress,
                format!("no mount point configured for {slot}"),
            ));
        }

        self.ensure_board_detected();
        let retention = self.bind(slot)?;

        tracing::debug!("Running {:?} with {} on {}", action, kind, slot);
        let mount_point = self.config.mount_point(slot);
        let applied = match slot {
            Slot::SdCard => apply_action(
                &mut self.board,
                &mut self.registry.sd,
                kind,
                mount_point,
                action,
            ),
            Slot::Usb => apply_action(
                &mut self.board,
                &mut self.registry.usb,
                kind,
                mount_point,
                action,
            ),
        };

        applied.inspect_err(|error| {
            tracing::debug!("{:?} on {} failed: {}", action, slot, error);
            if retention == Retention::Discard {
                self.dispose(slot);
            }
        })
    }
}
