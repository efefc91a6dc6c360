pub mod contract;
pub mod criteria;
pub mod destination;
pub mod geo;
pub mod recommendation;
pub mod unit;
