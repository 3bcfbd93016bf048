use aliri_braid::braid;
use std::fmt;

/// Hides the value unless formatted with the alternate flag
///
/// `{:#?}` shows a quoted preview of `$preview` characters, `{:#}` the whole
/// value. A width caps either form.
macro_rules! redacted {
    ($ty:ty, $label:literal, $preview:literal) => {
        impl fmt::Debug for $ty {
            fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
                if !f.alternate() {
                    return f.write_str(concat!("***", $label, "***"));
                }
                let (shown, cut) = preview(self.as_str(), f.width().unwrap_or($preview));
                write!(f, "\"{}{}\"", shown, if cut { "…" } else { "" })
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
                if !f.alternate() {
                    return f.write_str(concat!("***", $label, "***"));
                }
                let (shown, cut) = preview(self.as_str(), f.width().unwrap_or(usize::MAX));
                write!(f, "{}{}", shown, if cut { "…" } else { "" })
            }
        }
    };
}

/// Splits off at most `max_chars - 1` characters when `value` is longer than
/// `max_chars`, leaving room for an ellipsis
fn preview(value: &str, max_chars: usize) -> (&str, bool) {
    if value.chars().count() <= max_chars {
        return (value, false);
    }

    let keep = max_chars.saturating_sub(1);
    let end = value
        .char_indices()
        .nth(keep)
        .map_or(value.len(), |(idx, _)| idx);
    (&value[..end], true)
}

/// The application ID issued by the push provider
#[braid(serde)]
pub struct AppId;

/// The application secret issued alongside the [`AppId`]
#[braid(serde, debug = "owned", display = "owned")]
pub struct AppSecret;

redacted!(AppSecretRef, "APP SECRET", 5);

/// An access token returned by the authentication endpoint
#[braid(serde, debug = "owned", display = "owned")]
pub struct AccessToken;

redacted!(AccessTokenRef, "ACCESS TOKEN", 15);
