//! Option-string parsing for configuration directives.
//!
//! A directive value is a whitespace-separated list of tokens: bare flag
//! keywords (absolute), `+flag` / `-flag` (incremental), or the `None`
//! keyword (absolute reset). Keywords are case-insensitive. Repeated
//! directives in one scope accumulate, so parsing starts from the scope's
//! current declaration.

use crate::error::FilterError;
use crate::options::{Decl, OptionFlags};

fn keyword_flag(word: &str) -> Option<OptionFlags> {
    match word.to_ascii_lowercase().as_str() {
        "nohostfs" => Some(OptionFlags::NO_HOST_FS),
        "providerfs" => Some(OptionFlags::PROVIDER_FS),
        "xincludes" => Some(OptionFlags::XINCLUDES),
        _ => None,
    }
}

/// Parses one directive value on top of the scope's current declaration.
pub fn parse_options(optstr: &str, base: &Decl) -> Result<Decl, FilterError> {
    let (mut reset, mut opts, mut add, mut remove) = match base {
        Decl::Reset => (true, OptionFlags::NONE, OptionFlags::NONE, OptionFlags::NONE),
        Decl::Incremental { added, removed } => (false, OptionFlags::NONE, *added, *removed),
        Decl::Absolute {
            flags,
            added,
            removed,
        } => (false, *flags, *added, *removed),
    };

    // Flag tokens parsed in this call (not inherited from `base`); `None`
    // may not be combined with any of them, in either order.
    let mut flag_seen = false;

    for word in optstr.split_whitespace() {
        let (action, word) = match word.as_bytes().first() {
            Some(b'+') => (Some('+'), &word[1..]),
            Some(b'-') => (Some('-'), &word[1..]),
            _ => (None, word),
        };

        if word.eq_ignore_ascii_case("none") {
            if action.is_some() {
                return Err(FilterError::Config(
                    "cannot combine '+' or '-' with the 'None' keyword".to_string(),
                ));
            }
            reset = true;
            opts = OptionFlags::NONE;
            add = OptionFlags::NONE;
            remove = OptionFlags::NONE;
            continue;
        }

        let flag = keyword_flag(word)
            .ok_or_else(|| FilterError::Config(format!("invalid option keyword '{word}'")))?;
        flag_seen = true;
        match action {
            None => {
                opts |= flag;
                add = OptionFlags::NONE;
                remove = OptionFlags::NONE;
            }
            Some('+') => {
                add |= flag;
                remove = remove & !flag;
            }
            _ => {
                remove |= flag;
                add = add & !flag;
            }
        }
    }

    if reset && flag_seen {
        return Err(FilterError::Config(
            "cannot combine other option keywords with 'None'".to_string(),
        ));
    }

    Ok(if reset {
        Decl::Reset
    } else if opts.is_empty() {
        Decl::Incremental {
            added: add,
            removed: remove,
        }
    } else {
        Decl::Absolute {
            flags: opts,
            added: add,
            removed: remove,
        }
    })
}
