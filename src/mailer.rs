//! Outgoing mail: password reset links and order confirmations.

use async_trait::async_trait;
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{Mailbox, header::ContentType},
    transport::smtp::authentication::Credentials,
};

use crate::{config::SmtpConfig, models::Order};

#[derive(Debug, Clone, PartialEq)]
pub struct Email {
    pub to: String,
    pub subject: String,
    pub html: String,
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, email: Email) -> anyhow::Result<()>;
}

/// Writes messages to the log instead of delivering them. Used when no SMTP host is
/// configured.
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, email: Email) -> anyhow::Result<()> {
        tracing::info!(to = %email.to, subject = %email.subject, "mail not delivered (no SMTP host)");
        tracing::debug!(body = %email.html, "mail body");
        Ok(())
    }
}

pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpMailer {
    pub fn new(config: &SmtpConfig, from: &str) -> anyhow::Result<Self> {
        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::relay(&config.host)?;
        if let (Some(username), Some(password)) = (&config.username, &config.password) {
            builder = builder.credentials(Credentials::new(username.clone(), password.clone()));
        }
        Ok(Self {
            transport: builder.build(),
            from: from.parse()?,
        })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, email: Email) -> anyhow::Result<()> {
        let message = Message::builder()
            .from(self.from.clone())
            .to(email.to.parse()?)
            .subject(email.subject)
            .header(ContentType::TEXT_HTML)
            .body(email.html)?;
        self.transport.send(message).await?;
        Ok(())
    }
}

/// Renders minor currency units as `123.45`.
pub fn format_amount(amount: i64) -> String {
    let sign = if amount < 0 { "-" } else { "" };
    let abs = amount.unsigned_abs();
    format!("{sign}{}.{:02}", abs / 100, abs % 100)
}

/// Escapes text interpolated into HTML mail bodies.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

pub fn password_reset_email(to: &str, name: &str, reset_link: &str) -> Email {
    let name = escape_html(name);
    let reset_link = escape_html(reset_link);
    let html = format!(
        "<h1>Password reset</h1>\
         <p>Hello {name},</p>\
         <p>We received a request to reset the password for your account.</p>\
         <p><a href=\"{reset_link}\" target=\"_blank\">Reset my password</a></p>\
         <p>This link is valid for 1 hour.</p>\
         <p>If you did not ask for this, you can ignore this email.</p>"
    );
    Email {
        to: to.to_string(),
        subject: "Password reset request".to_string(),
        html,
    }
}

pub fn order_confirmation_email(to: &str, name: &str, order: &Order) -> Email {
    let rows: String = order
        .order_items
        .iter()
        .map(|item| {
            format!(
                "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>",
                escape_html(&item.name),
                item.quantity,
                format_amount(item.price),
                format_amount(item.price.saturating_mul(i64::from(item.quantity))),
            )
        })
        .collect();

    let name = escape_html(name);
    let subtotal = order.total_price.saturating_sub(order.shipping_cost);
    let shipping = if order.shipping_cost > 0 {
        format_amount(order.shipping_cost)
    } else {
        "Free".to_string()
    };

    let html = format!(
        "<h1>Order received</h1>\
         <p>Hello {name},</p>\
         <p>Your order has been placed. Details are below.</p>\
         <p><strong>Order number:</strong> #{id}<br><strong>Order date:</strong> {date}</p>\
         <table>\
         <thead><tr><th>Product</th><th>Qty</th><th>Unit price</th><th>Total</th></tr></thead>\
         <tbody>{rows}</tbody>\
         <tfoot>\
         <tr><td colspan=\"3\">Subtotal</td><td>{subtotal}</td></tr>\
         <tr><td colspan=\"3\">Shipping</td><td>{shipping}</td></tr>\
         <tr><td colspan=\"3\"><strong>Total</strong></td><td><strong>{total}</strong></td></tr>\
         </tfoot>\
         </table>\
         <p>Thank you for shopping with us.</p>",
        id = order.id,
        date = order.created_at.format("%Y-%m-%d"),
        subtotal = format_amount(subtotal),
        total = format_amount(order.total_price),
    );

    Email {
        to: to.to_string(),
        subject: format!("Order received - #{}", order.id),
        html,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn amounts_render_with_two_decimals() {
        assert_eq!(format_amount(0), "0.00");
        assert_eq!(format_amount(2_005), "20.05");
        assert_eq!(format_amount(-150), "-1.50");
    }

    #[test]
    fn reset_email_carries_the_link() {
        let email = password_reset_email("a@b.io", "Ada", "http://x/reset-password?token=abc");
        assert_eq!(email.to, "a@b.io");
        assert!(email.html.contains("http://x/reset-password?token=abc"));
        assert!(email.html.contains("Ada"));
    }

    #[test]
    fn names_are_escaped_in_html() {
        assert_eq!(escape_html("<b>Tom & \"Jerry\"</b>"), "&lt;b&gt;Tom &amp; &quot;Jerry&quot;&lt;/b&gt;");

        let email = password_reset_email("a@b.io", "<script>x</script>", "http://x/r?token=1");
        assert!(!email.html.contains("<script>"));
        assert!(email.html.contains("&lt;script&gt;x&lt;/script&gt;"));
    }

    #[test]
    fn order_mail_escapes_item_names_and_shows_free_shipping() {
        use crate::models::{OrderItem, ShippingAddress};
        use chrono::Utc;
        use uuid::Uuid;

        let now = Utc::now();
        let order = Order {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            order_items: vec![OrderItem {
                product_id: Uuid::new_v4(),
                name: "<img src=x>".into(),
                price: 1_250,
                quantity: 2,
            }],
            shipping_address: ShippingAddress {
                address: "a".into(),
                city: "b".into(),
                postal_code: "c".into(),
                country: "d".into(),
            },
            payment_method: "Credit Card".into(),
            shipping_cost: 0,
            total_price: 2_500,
            is_paid: true,
            paid_at: Some(now),
            is_delivered: false,
            delivered_at: None,
            created_at: now,
            updated_at: now,
        };

        let email = order_confirmation_email("a@b.io", "Ada", &order);
        assert!(!email.html.contains("<img"));
        assert!(email.html.contains("&lt;img src=x&gt;"));
        assert!(email.html.contains("25.00"));
        assert!(email.html.contains("Free"));
    }
}
