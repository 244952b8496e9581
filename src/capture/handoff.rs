//! Single-slot frame hand-off between the capture thread and the render loop

use std::mem;
use std::sync::Mutex;

/// Overwrite-on-publish mailbox holding the most recent frame of one stream.
///
/// Exactly one frame is ever in flight: a publish before the previous frame
/// was consumed discards it (last-write-wins, no queueing). Both sides
/// exchange buffers by swapping, so the lock is only ever held for an O(1)
/// pointer exchange, never for a frame copy or any I/O.
pub struct FrameMailbox {
    slot: Mutex<Slot>,
    frame_len: usize,
}

struct Slot {
    storage: Vec<u8>,
    ready: bool,
}

impl FrameMailbox {
    /// Create a mailbox for frames of exactly `frame_len` bytes.
    pub fn new(frame_len: usize) -> Self {
        Self {
            slot: Mutex::new(Slot {
                storage: vec![0; frame_len],
                ready: false,
            }),
            frame_len,
        }
    }

    /// Fixed frame size this mailbox was created with.
    pub fn len(&self) -> usize {
        self.frame_len
    }

    pub fn is_empty(&self) -> bool {
        self.frame_len == 0
    }

    /// Producer side: swap `frame` in as the latest frame and mark it unread.
    ///
    /// On return `frame` holds the previous storage contents, ready for reuse
    /// as the producer's next scratch buffer. An unconsumed previous frame is
    /// silently superseded.
    ///
    /// Panics if `frame` is not exactly [`len`](Self::len) bytes; a mismatched
    /// publish is a wiring bug, not a runtime condition.
    pub fn publish(&self, frame: &mut Vec<u8>) {
        assert_eq!(frame.len(), self.frame_len, "published frame has wrong size");
        let mut slot = self.lock();
        mem::swap(&mut slot.storage, frame);
        slot.ready = true;
    }

    /// Consumer side: if an unread frame is present, swap it into `dest` and
    /// return `true`. Otherwise return `false` with `dest` untouched, and the
    /// caller keeps showing whatever it already has.
    ///
    /// Panics if `dest` is not exactly [`len`](Self::len) bytes.
    pub fn take_if_new(&self, dest: &mut Vec<u8>) -> bool {
        assert_eq!(dest.len(), self.frame_len, "destination has wrong size");
        let mut slot = self.lock();
        if !slot.ready {
            return false;
        }
        mem::swap(&mut slot.storage, dest);
        slot.ready = false;
        true
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Slot> {
        // A swap cannot be observed half-done, so a poisoned lock still holds
        // a consistent slot.
        self.slot.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn publish_then_take_round_trips() {
        let mailbox = FrameMailbox::new(16);
        let mut frame: Vec<u8> = (0..16).collect();
        let original = frame.clone();

        mailbox.publish(&mut frame);
        let mut dest = vec![0u8; 16];
        assert!(mailbox.take_if_new(&mut dest));
        assert_eq!(dest, original);
    }

    #[test]
    fn second_publish_supersedes_unconsumed_frame() {
        let mailbox = FrameMailbox::new(4);
        let mut a = vec![0xAA; 4];
        let mut b = vec![0xBB; 4];

        mailbox.publish(&mut a);
        mailbox.publish(&mut b);

        let mut dest = vec![0u8; 4];
        assert!(mailbox.take_if_new(&mut dest));
        assert_eq!(dest, vec![0xBB; 4]);
        // A is gone; nothing further is readable.
        assert!(!mailbox.take_if_new(&mut dest));
    }

    #[test]
    fn take_without_new_frame_leaves_dest_untouched() {
        let mailbox = FrameMailbox::new(4);
        let mut frame = vec![0x11; 4];
        mailbox.publish(&mut frame);

        let mut dest = vec![0u8; 4];
        assert!(mailbox.take_if_new(&mut dest));
        let first = dest.clone();

        assert!(!mailbox.take_if_new(&mut dest));
        assert_eq!(dest, first);
    }

    #[test]
    #[should_panic(expected = "wrong size")]
    fn undersized_publish_is_a_contract_violation() {
        let mailbox = FrameMailbox::new(8);
        mailbox.publish(&mut vec![0u8; 7]);
    }

    /// One thread publishes frames tagged with a monotonically increasing
    /// counter while another polls. The consumer must never see the tag go
    /// backwards and must never see a torn frame mixing two tags.
    #[test]
    fn concurrent_publish_is_never_torn_or_stale() {
        const FRAME_LEN: usize = 64;
        const LAST_TAG: u32 = 20_000;

        let mailbox = Arc::new(FrameMailbox::new(FRAME_LEN));

        let producer = {
            let mailbox = Arc::clone(&mailbox);
            thread::spawn(move || {
                let mut scratch = vec![0u8; FRAME_LEN];
                for tag in 1..=LAST_TAG {
                    for word in scratch.chunks_exact_mut(4) {
                        word.copy_from_slice(&tag.to_le_bytes());
                    }
                    mailbox.publish(&mut scratch);
                }
            })
        };

        let mut dest = vec![0u8; FRAME_LEN];
        let mut last_seen = 0u32;
        while last_seen < LAST_TAG {
            if !mailbox.take_if_new(&mut dest) {
                continue;
            }
            let tag = u32::from_le_bytes(dest[..4].try_into().unwrap());
            for word in dest.chunks_exact(4) {
                assert_eq!(word, tag.to_le_bytes(), "torn frame at tag {tag}");
            }
            assert!(tag >= last_seen, "tag went backwards: {tag} < {last_seen}");
            last_seen = tag;
        }

        producer.join().unwrap();
    }
}
