/*++

Licensed under the Apache-2.0 license.

File Name:

    printer.rs

Abstract:

    File contains support routines and macros to print boot-time log output

--*/
use core::convert::Infallible;
use spin::Once;
use ufmt::{uDisplay, uWrite};

static SINK: Once<fn(&str)> = Once::new();

/// Route log output to `sink`.
///
/// The boot-time logging framework installs its sink once, before the
/// provisioning flows run. Returns false if a sink was already installed.
pub fn install_sink(sink: fn(&str)) -> bool {
    let mut installed = false;
    SINK.call_once(|| {
        installed = true;
        sink
    });
    installed
}

#[derive(Default)]
pub struct Printer;

impl uWrite for Printer {
    type Error = Infallible;

    /// Writes a string slice into this writer, returning whether the write succeeded.
    #[cfg(not(feature = "std"))]
    #[inline(never)]
    fn write_str(&mut self, str: &str) -> Result<(), Self::Error> {
        if let Some(sink) = SINK.get() {
            sink(str);
        }
        Ok(())
    }

    /// Writes a string slice into this writer, returning whether the write succeeded.
    #[cfg(feature = "std")]
    fn write_str(&mut self, str: &str) -> Result<(), Self::Error> {
        match SINK.get() {
            Some(sink) => sink(str),
            None => print!("{str}"),
        }
        Ok(())
    }
}

#[macro_export]
macro_rules! cprint {
    ($($tt:tt)*) => {{
        let _ = ufmt::uwrite!(&mut $crate::printer::Printer::default(), $($tt)*);
    }}
}

#[macro_export]
macro_rules! cprintln {
    ($($tt:tt)*) => {{
        let _ = ufmt::uwriteln!(&mut $crate::printer::Printer::default(), $($tt)*);
    }}
}

pub struct HexBytes<'a>(pub &'a [u8]);
impl uDisplay for HexBytes<'_> {
    fn fmt<W>(&self, f: &mut ufmt::Formatter<'_, W>) -> Result<(), W::Error>
    where
        W: uWrite + ?Sized,
    {
        for byte in self.0.iter() {
            ufmt::uwrite!(f, "{:02X}", *byte)?;
        }
        Ok(())
    }
}
