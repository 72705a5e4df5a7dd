pub mod cart_flows;
pub mod realtime_flows;
pub mod session_flows;
