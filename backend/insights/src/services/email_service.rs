use anyhow::{Context, Result};
use lettre::{
    message::{header::ContentType, Attachment, Body, Mailbox, MultiPart, SinglePart},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};

use crate::{config::EmailSettings, models::EnrichedReport};

/// Dispatches the daily insights email: HTML summary rendered from the
/// enriched report, with the pie chart attached.
pub struct EmailService {
    settings: EmailSettings,
}

impl EmailService {
    pub fn new(settings: EmailSettings) -> Self {
        Self { settings }
    }

    pub async fn send_insights_email(
        &self,
        report: &EnrichedReport,
        chart_png: Vec<u8>,
    ) -> Result<()> {
        let from_address: Mailbox = format!(
            "{} <{}>",
            report.emailer_name, self.settings.username
        )
        .parse()
        .context("Invalid sender email address")?;
        let to_address: Mailbox = self
            .settings
            .recipient
            .parse()
            .context("Invalid recipient email address")?;

        let chart_part = Attachment::new("chart.png".to_string()).body(
            Body::new(chart_png),
            ContentType::parse("image/png").context("Invalid chart attachment content type")?,
        );

        let email = Message::builder()
            .from(from_address)
            .to(to_address)
            .subject(subject_line(report))
            .multipart(
                MultiPart::mixed()
                    .singlepart(SinglePart::html(render_html(report)))
                    .singlepart(chart_part),
            )
            .context("Failed to build insights email")?;

        let mailer = self.build_mailer()?;
        mailer
            .send(email)
            .await
            .context("Failed to send insights email")?;

        Ok(())
    }

    fn build_mailer(&self) -> Result<AsyncSmtpTransport<Tokio1Executor>> {
        let creds = Credentials::new(
            self.settings.username.clone(),
            self.settings.password.clone(),
        );

        let builder = if self.settings.use_tls {
            AsyncSmtpTransport::<Tokio1Executor>::relay(&self.settings.server)
                .context("Invalid SMTP server for TLS")?
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&self.settings.server)
        }
        .port(self.settings.port)
        .credentials(creds);

        Ok(builder.build())
    }
}

/// `Performance Insights - {name}[ - {code}] - {dd-mm-yyyy}`; the code
/// segment disappears when no examination code is configured.
pub fn subject_line(report: &EnrichedReport) -> String {
    let code_segment = report
        .examination_code
        .as_deref()
        .map(|code| format!(" - {}", code))
        .unwrap_or_default();

    format!(
        "Performance Insights - {}{} - {}",
        report.examination_name, code_segment, report.current_date
    )
}

fn render_html(report: &EnrichedReport) -> String {
    let mut html = String::new();

    let heading = match report.examination_code.as_deref() {
        Some(code) => format!("{} ({})", report.examination_name, code),
        None => report.examination_name.clone(),
    };
    html.push_str(&format!(
        "<html><body>\n<h2>Performance Insights - {}</h2>\n<p>Date: {}</p>\n",
        escape_html(&heading),
        escape_html(&report.current_date)
    ));

    html.push_str(&format!(
        "<p>Questions attempted: <strong>{}</strong></p>\n",
        report.report.questions_attempted
    ));

    match &report.report.insights {
        None => {
            html.push_str("<p>No questions were attempted today.</p>\n");
        }
        Some(insights) => {
            html.push_str(&format!(
                "<ul>\n<li>Correct: {} ({})</li>\n<li>Incorrect: {} ({})</li>\n</ul>\n",
                insights.correct.number,
                format_percentage(insights.correct.percentage),
                insights.incorrect.number,
                format_percentage(insights.incorrect.percentage),
            ));

            if let Some(detailed) = &insights.incorrect.detailed_insights {
                html.push_str(
                    "<h3>Failure causes</h3>\n<table border=\"1\" cellpadding=\"4\">\n\
                     <tr><th>Cause</th><th>Count</th><th>Share</th></tr>\n",
                );
                for cause in detailed {
                    html.push_str(&format!(
                        "<tr><td>{}</td><td>{}</td><td>{:.2}%</td></tr>\n",
                        escape_html(&cause.cause),
                        cause.number,
                        cause.percentage
                    ));
                }
                html.push_str("</table>\n");
            }
        }
    }

    html.push_str(&format!(
        "<p>The daily chart is attached.</p>\n<p>Sent by {}</p>\n</body></html>\n",
        escape_html(&report.emailer_name)
    ));

    html
}

fn format_percentage(percentage: Option<f64>) -> String {
    match percentage {
        Some(value) => format!("{:.2}%", value),
        None => "n/a".to_string(),
    }
}

fn escape_html(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}
