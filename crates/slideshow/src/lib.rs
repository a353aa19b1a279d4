//! Pure sequencing logic for the crystal-ball slideshow: the photo
//! corpus, the crossfade state machine, the lens motion curves and the
//! pausable animation clock. Nothing in this crate touches the GPU or
//! the window system, so everything here is unit-testable with plain
//! `Instant` arithmetic.

mod clock;
mod corpus;
mod fade;
mod lens;

pub use clock::PauseClock;
pub use corpus::{CorpusError, PhotoSet};
pub use fade::{CrossfadeScheduler, SlideDirection, SlideEvent};
pub use lens::{lens_at, LensState};
