// RS485 Bridge - USB/RS485 Serial Bridge Firmware
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

// tracing needs liballoc, so firmware builds compile these away.

macro_rules! log_trace {
    ($($arg:tt)*) => {
        #[cfg(feature = "std")]
        tracing::trace!($($arg)*);
    };
}

macro_rules! log_debug {
    ($($arg:tt)*) => {
        #[cfg(feature = "std")]
        tracing::debug!($($arg)*);
    };
}

macro_rules! log_info {
    ($($arg:tt)*) => {
        #[cfg(feature = "std")]
        tracing::info!($($arg)*);
    };
}

macro_rules! log_error {
    ($($arg:tt)*) => {
        #[cfg(feature = "std")]
        tracing::error!($($arg)*);
    };
}
