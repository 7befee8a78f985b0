mod noise_injector;

pub use noise_injector::{NoiseInjector, NoiseProfile};
