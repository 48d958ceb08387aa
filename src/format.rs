//! Result formatting (§4.16, interface-only per spec.md §1 but implemented
//! concretely). Grounded on `original_source/loco.c`'s
//! `result_format_validate`/`result_format_write`.
//!
//! Recognized tokens: `%be %am %AM %bl %bu %bw %pd %ul %pm %ps %lt`.

use crate::error::EngineError;
use crate::types::{Assessment, Estimate};

/// Everything the formatter needs beyond the final [`Estimate`], mirroring
/// the fields loco.c's token table draws from session state.
#[derive(Debug, Clone, Copy, Default)]
pub struct FormatContext {
    pub prelim_bw_mean: f64,
    pub prelim_bw_std: f64,
    pub bin_width: f64,
    pub packet_dispersion_delta_min: f64,
    pub latency_udp_kernel_user_average: f64,
    pub rtt_tcp_socket_average: f64,
}

const TOKENS: &[&str] = &[
    "%be", "%am", "%AM", "%bl", "%bu", "%bw", "%pd", "%ul", "%pm", "%ps", "%lt",
];

pub struct Formatter {
    template: String,
}

impl Formatter {
    /// Validates `template` against the known token set, failing fatally
    /// (as `result_format_validate` does) on an unrecognized `%token`.
    pub fn new(template: &str) -> Result<Self, EngineError> {
        let mut rest = template;
        while let Some(pos) = rest.find('%') {
            let tail = &rest[pos..];
            let token_len = tail
                .char_indices()
                .skip(1)
                .find(|(_, c)| !c.is_ascii_alphabetic())
                .map(|(i, _)| i)
                .unwrap_or(tail.len());
            let token = &tail[..token_len.max(1)];
            if !TOKENS.contains(&token) {
                return Err(EngineError::Configuration(format!(
                    "unknown format token: {token}"
                )));
            }
            rest = &tail[token_len.max(1)..];
        }
        Ok(Self {
            template: template.to_string(),
        })
    }

    /// Renders the estimate/context against the validated template,
    /// comma-joining any whitespace-separated tokens in the source
    /// template (matching loco.c's space-delimited format strings emitted
    /// as a comma-joined line).
    pub fn render(&self, estimate: &Estimate, ctx: &FormatContext) -> String {
        self.template
            .split_whitespace()
            .map(|tok| self.expand(tok, estimate, ctx))
            .collect::<Vec<_>>()
            .join(",")
    }

    fn expand(&self, token: &str, estimate: &Estimate, ctx: &FormatContext) -> String {
        match token {
            "%be" => format!("{:.4}", estimate.bandwidth),
            "%am" => format!("{}", estimate.assessment as i32),
            "%AM" => estimate.assessment.to_string(),
            "%bl" => format!("{:.4}", estimate.lo),
            "%bu" => format!("{:.4}", estimate.hi),
            "%bw" => format!("{:.4}", ctx.bin_width),
            "%pd" => format!("{:.4}", ctx.packet_dispersion_delta_min),
            "%ul" => format!("{:.4}", ctx.latency_udp_kernel_user_average),
            "%pm" => format!("{:.4}", ctx.prelim_bw_mean),
            "%ps" => format!("{:.4}", ctx.prelim_bw_std),
            "%lt" => format!("{:.4}", ctx.rtt_tcp_socket_average),
            other => assessment_fallback(other, estimate.assessment),
        }
    }
}

fn assessment_fallback(token: &str, assessment: Assessment) -> String {
    format!("{token}:{assessment}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_rejects_unknown_token() {
        assert!(Formatter::new("%zz").is_err());
    }

    #[test]
    fn validation_accepts_documented_tokens() {
        assert!(Formatter::new("%be %am %AM %bl %bu %bw %pd %ul %pm %ps %lt").is_ok());
    }

    #[test]
    fn render_produces_comma_joined_line() {
        let formatter = Formatter::new("%be %bl %bu").unwrap();
        let estimate = Estimate {
            bandwidth: 48.5,
            lo: 45.5,
            hi: 51.5,
            assessment: Assessment::Mode,
        };
        let rendered = formatter.render(&estimate, &FormatContext::default());
        assert_eq!(rendered, "48.5000,45.5000,51.5000");
    }

    #[test]
    fn am_and_am_literal_report_distinct_assessment_views() {
        let formatter = Formatter::new("%am %AM").unwrap();
        let estimate = Estimate {
            bandwidth: 48.5,
            lo: 45.5,
            hi: 51.5,
            assessment: Assessment::NoMode,
        };
        let rendered = formatter.render(&estimate, &FormatContext::default());
        assert_eq!(rendered, "3,NOMODE");
    }

    #[test]
    fn pm_ps_lt_read_prelim_and_rtt_context_fields() {
        let formatter = Formatter::new("%pm %ps %lt").unwrap();
        let estimate = Estimate {
            bandwidth: 48.5,
            lo: 45.5,
            hi: 51.5,
            assessment: Assessment::Mode,
        };
        let ctx = FormatContext {
            prelim_bw_mean: 100.0,
            prelim_bw_std: 5.5,
            rtt_tcp_socket_average: 250.0,
            ..FormatContext::default()
        };
        let rendered = formatter.render(&estimate, &ctx);
        assert_eq!(rendered, "100.0000,5.5000,250.0000");
    }
}
