pub mod bounds;
pub mod distributions;
pub mod transform;
pub mod vec;
