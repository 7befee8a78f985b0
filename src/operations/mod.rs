pub mod graph;
pub mod noise;
pub mod offset;
pub mod quantize;
pub mod simplify;
pub mod tour;
