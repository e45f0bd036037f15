//! Human-verification challenges that gate the viewer.

use std::future::Future;

use rand::Rng;
use reqwest::{Client, Url};
use serde::Deserialize;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

/// Verification fault.
#[derive(Debug, thiserror::Error)]
pub enum ChallengeError {
    #[error("verification rejected: {0}")]
    Rejected(String),
    #[error("verification service unreachable: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("verification aborted")]
    Aborted,
}

/// A challenge the user must pass before the viewer starts polling.
pub trait Challenge {
    fn verify(&mut self) -> impl Future<Output = Result<(), ChallengeError>>;
}

#[derive(Debug, Deserialize)]
struct SiteVerifyResponse {
    success: bool,
    #[serde(rename = "error-codes", default)]
    error_codes: Vec<String>,
}

/// Checks a Cloudflare Turnstile token against the `siteverify` endpoint.
#[derive(Debug, Clone)]
pub struct TurnstileChallenge {
    client: Client,
    siteverify_url: Url,
    secret: String,
    token: String,
    remote_ip: Option<String>,
}

impl TurnstileChallenge {
    pub fn new(siteverify_url: Url, secret: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            siteverify_url,
            secret: secret.into(),
            token: token.into(),
            remote_ip: None,
        }
    }

    /// Pass the visitor's address along with the token.
    pub fn remote_ip(mut self, ip: impl Into<String>) -> Self {
        self.remote_ip = Some(ip.into());
        self
    }

    async fn siteverify(&self) -> Result<(), ChallengeError> {
        let mut form = vec![
            ("secret", self.secret.as_str()),
            ("response", self.token.as_str()),
        ];
        if let Some(ip) = &self.remote_ip {
            form.push(("remoteip", ip.as_str()));
        }

        let reply: SiteVerifyResponse = self
            .client
            .post(self.siteverify_url.clone())
            .form(&form)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        if reply.success {
            tracing::debug!("Turnstile token accepted");
            Ok(())
        } else if reply.error_codes.is_empty() {
            Err(ChallengeError::Rejected("token not accepted".into()))
        } else {
            Err(ChallengeError::Rejected(reply.error_codes.join(", ")))
        }
    }
}

impl Challenge for TurnstileChallenge {
    fn verify(&mut self) -> impl Future<Output = Result<(), ChallengeError>> {
        self.siteverify()
    }
}

/// Terminal check: asks for the sum of two small numbers.
pub struct PromptChallenge<R, W> {
    input: R,
    output: W,
    operands: Option<(u32, u32)>,
}

impl<R, W> PromptChallenge<R, W>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    /// New operands are drawn for every attempt.
    pub fn new(input: R, output: W) -> Self {
        Self {
            input,
            output,
            operands: None,
        }
    }

    /// Always ask the same question.
    pub fn with_operands(input: R, output: W, a: u32, b: u32) -> Self {
        Self {
            input,
            output,
            operands: Some((a, b)),
        }
    }

    async fn ask(&mut self) -> Result<(), ChallengeError> {
        let (a, b) = self.operands.unwrap_or_else(|| {
            let mut rng = rand::thread_rng();
            (rng.gen_range(1..=9), rng.gen_range(1..=9))
        });

        self.output
            .write_all(format!("Verify you're human: what is {a} + {b}? ").as_bytes())
            .await?;
        self.output.flush().await?;

        let mut line = String::new();
        if self.input.read_line(&mut line).await? == 0 {
            return Err(ChallengeError::Aborted);
        }

        match line.trim().parse::<u32>() {
            Ok(answer) if answer == a + b => Ok(()),
            _ => Err(ChallengeError::Rejected("wrong answer".into())),
        }
    }
}

impl<R, W> Challenge for PromptChallenge<R, W>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    fn verify(&mut self) -> impl Future<Output = Result<(), ChallengeError>> {
        self.ask()
    }
}
