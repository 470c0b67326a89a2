//! The per-thread recording slot that [`BReverse`](crate::breverse::BReverse)
//! operations write to.

use std::cell::Cell;
use std::ptr;
use std::thread::LocalKey;

use crate::float::Float;

use super::BytecodeTape;

/// A float type whose operations can be recorded on a [`BytecodeTape`].
///
/// Each type owns one recording slot per thread, so `f32` and `f64` tapes can
/// be recorded at the same time without interfering.
pub trait TapeFloat: Float {
    #[doc(hidden)]
    fn recording_slot() -> &'static LocalKey<Cell<*mut BytecodeTape<Self>>>;
}

macro_rules! impl_tape_float {
    ($($t:ty => $slot:ident),* $(,)?) => {
        thread_local! {
            $(static $slot: Cell<*mut BytecodeTape<$t>> = const { Cell::new(ptr::null_mut()) };)*
        }

        $(
            impl TapeFloat for $t {
                fn recording_slot() -> &'static LocalKey<Cell<*mut BytecodeTape<$t>>> {
                    &$slot
                }
            }
        )*
    };
}

impl_tape_float!(f32 => RECORDING_F32, f64 => RECORDING_F64);

/// Run `f` against the tape this thread is recording into.
///
/// # Panics
///
/// If no [`RecordingGuard`] is alive on this thread.
#[inline]
pub fn with_recording_tape<F: TapeFloat, R>(f: impl FnOnce(&mut BytecodeTape<F>) -> R) -> R {
    let tape = F::recording_slot().with(Cell::get);
    assert!(
        !tape.is_null(),
        "no tape is recording; tape variables only exist inside adsweep::record() \
         or a derivative() call that records"
    );
    // SAFETY: the pointer was installed by a RecordingGuard that holds the
    // tape's unique borrow until it drops and clears the slot.
    f(unsafe { &mut *tape })
}

/// Installs a tape as this thread's recording target for its lifetime.
///
/// Dropping the guard restores whatever was recording before, so recordings
/// nest, and a panic inside the recorded function cannot leave a dangling
/// slot behind.
pub struct RecordingGuard<'a, F: TapeFloat> {
    previous: *mut BytecodeTape<F>,
    _tape: std::marker::PhantomData<&'a mut BytecodeTape<F>>,
}

impl<'a, F: TapeFloat> RecordingGuard<'a, F> {
    /// Start recording into `tape`.
    pub fn new(tape: &'a mut BytecodeTape<F>) -> Self {
        let previous = F::recording_slot().with(|slot| slot.replace(tape));
        RecordingGuard {
            previous,
            _tape: std::marker::PhantomData,
        }
    }
}

impl<F: TapeFloat> Drop for RecordingGuard<'_, F> {
    fn drop(&mut self) {
        F::recording_slot().with(|slot| slot.set(self.previous));
    }
}
