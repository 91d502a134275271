pub(crate) mod json;
pub(crate) mod net;
pub(crate) mod op_timer;
