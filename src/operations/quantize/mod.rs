mod grid_quantizer;

pub use grid_quantizer::{quantise, GridQuantizer, MAX_LATTICE_CELLS};
