// Licensed under the Apache-2.0 license

//! Host-side models of the OTP and eFuse hardware, for driving the
//! provisioning flows from tests.

mod efuse;
mod otp;
mod rng;

pub use efuse::{EfuseCall, SimEfuse, SimKeyBlock};
pub use otp::{OtpWrite, SimOtp};
pub use rng::SimRng;
