//! `AstPrinter`: renders a rewritten `syn::File` back to formatted source
//! text, honoring cancellation before writing.

use crate::context::CancelToken;
use crate::error::GopiumError;
use crate::writer::Writer;

pub trait AstPrinter: Send + Sync {
    fn print(&self, ctx: &CancelToken, w: &mut dyn Writer, file: &syn::File) -> Result<(), GopiumError>;
}

/// `prettyplease` is the de facto `syn`-ecosystem pretty-printer, paired
/// with `syn`/`quote`/`proc-macro2`.
#[derive(Clone, Copy, Default)]
pub struct PrettyPlease;

impl AstPrinter for PrettyPlease {
    fn print(&self, ctx: &CancelToken, w: &mut dyn Writer, file: &syn::File) -> Result<(), GopiumError> {
        ctx.err()?;
        let text = prettyplease::unparse(file);
        w.write(text.as_bytes())?;
        w.close()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::writer::VecWriter;

    #[test]
    fn prints_valid_rust_source() {
        let file: syn::File = syn::parse_str("struct Foo { a: u8 }").unwrap();
        let mut w = VecWriter::default();
        PrettyPlease.print(&CancelToken::new(), &mut w, &file).unwrap();
        let out = String::from_utf8(w.into_inner()).unwrap();
        assert!(out.contains("struct Foo"));
    }

    #[test]
    fn refuses_to_print_after_cancellation() {
        let file: syn::File = syn::parse_str("struct Foo { a: u8 }").unwrap();
        let mut w = VecWriter::default();
        let ctx = CancelToken::new();
        ctx.cancel();
        let err = PrettyPlease.print(&ctx, &mut w, &file).unwrap_err();
        assert!(matches!(err, GopiumError::Cancellation));
    }
}
