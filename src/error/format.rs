use crate::error::{ErrorContext, ForkerError};

pub fn format_error_chain(error: &ForkerError) -> String {
    let context = ErrorContext::new(error);
    context.to_string()
}
