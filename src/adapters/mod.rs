//! Adapters — concrete implementations of the port traits and the
//! outer surfaces of the controller.
//!
//! | Adapter    | Implements   | Connects to                   |
//! |------------|--------------|-------------------------------|
//! | `serial`   | Transport    | USB serial sensor/relay board |
//! | `log_sink` | EventSink    | Log output (subscriber)       |
//! | `console`  | —            | Line commands (stdin)         |

pub mod console;
pub mod log_sink;
#[cfg(feature = "serial")]
pub mod serial;
