//! `passvault generate`: print freshly generated passwords.
//!
//! Generation never touches the vault, so no unlock is needed.

use crate::cli::{Cli, Context, GenerateArgs};
use crate::errors::{PassVaultError, Result};
use crate::generator::GeneratorPolicy;

/// Execute the `generate` command.
pub fn execute(cli: &Cli, args: &GenerateArgs) -> Result<()> {
    let ctx = Context::load(cli)?;

    if args.count == 0 {
        return Err(PassVaultError::CommandFailed("--count must be at least 1".into()));
    }

    let policy = custom_policy(args);
    for _ in 0..args.count {
        let password = match (&policy, args.pronounceable, &args.preset) {
            (Some(policy), _, _) => ctx.service.generate_password_custom(policy)?,
            (None, Some(length), _) => ctx.service.generate_pronounceable(length)?,
            (None, None, Some(preset)) => ctx.service.generate_password_preset(preset)?,
            (None, None, None) => ctx
                .service
                .generate_password_preset(&ctx.settings.default_preset)?,
        };
        println!("{password}");
    }

    Ok(())
}

/// Build a custom policy when `--length` was given.
fn custom_policy(args: &GenerateArgs) -> Option<GeneratorPolicy> {
    let length = args.length?;
    Some(GeneratorPolicy {
        length,
        upper: !args.no_upper,
        lower: !args.no_lower,
        digits: !args.no_digits,
        symbols: !args.no_symbols,
        exclude_ambiguous: args.exclude_ambiguous,
        require_each_type: args.require_each,
    })
}
