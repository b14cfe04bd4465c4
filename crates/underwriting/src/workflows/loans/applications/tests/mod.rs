mod assessment;
mod common;
mod routing;
