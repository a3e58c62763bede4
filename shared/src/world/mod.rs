pub mod bounds;
pub mod fog;
pub mod terrain;

pub use bounds::*;
pub use fog::*;
pub use terrain::*;
