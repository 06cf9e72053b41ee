use clap::Args;
use lead_capture::error::AppError;
use lead_capture::leads::{render_access_email, AccessToken, LeadData};

#[derive(Args, Debug)]
pub(crate) struct PreviewEmailArgs {
    /// First name used in the greeting
    #[arg(long)]
    pub(crate) first_name: String,
    /// Guide link placed behind the call-to-action button
    #[arg(long)]
    pub(crate) access_url: String,
}

pub(crate) fn run_preview_email(args: PreviewEmailArgs) -> Result<(), AppError> {
    println!("{}", preview_email(args));
    Ok(())
}

pub(crate) fn run_token() -> Result<(), AppError> {
    println!("{}", AccessToken::generate());
    Ok(())
}

fn preview_email(args: PreviewEmailArgs) -> String {
    let lead = LeadData {
        first_name: args.first_name,
        last_name: String::new(),
        email: String::new(),
        phone: String::new(),
        source: None,
        timestamp: None,
        access_token: AccessToken::generate(),
        access_url: args.access_url,
    };
    render_access_email(&lead)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preview_renders_name_and_link() {
        let html = preview_email(PreviewEmailArgs {
            first_name: "Jane".to_string(),
            access_url: "https://gamma.app/docs/guide?ref=abc-123".to_string(),
        });

        assert!(html.contains("Jane"));
        assert!(html.contains("https://gamma.app/docs/guide?ref=abc-123"));
    }
}
