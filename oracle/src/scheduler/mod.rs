pub mod cycle;

pub use cycle::UpdateCycle;
