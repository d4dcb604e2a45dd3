mod audio;
mod ids;
mod track;
mod vibe;

pub use audio::{AudioBuffer, AudioFormat, SampleRate};
pub use ids::TrackId;
pub use track::{Track, TrackOrigin};
pub use vibe::{VibeAnalysis, DEFAULT_GRADIENT_FROM, DEFAULT_GRADIENT_TO};
