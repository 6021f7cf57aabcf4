mod constants;
mod waves;

pub use waves::WavesScene;
