mod route_simplifier;

pub use route_simplifier::{simplify, RouteSimplifier};
