pub(crate) mod bootstrap;
pub(crate) mod loop_runner;
pub(crate) mod orders;
pub(crate) mod replay;
