pub(crate) mod describe;
pub(crate) mod filter;
pub(crate) mod pick;
