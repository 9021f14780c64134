pub mod normalize;
pub mod reference_point;
pub mod regression;
pub mod density;
pub mod panels;
