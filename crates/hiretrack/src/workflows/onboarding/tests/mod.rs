mod actions;
mod common;
mod interview;
mod routing;
