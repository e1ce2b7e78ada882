//! Keyword-driven assistant. Answers from the service's own data; anything it
//! does not recognise gets a role-specific overview of what it can help with.

use serde::{Deserialize, Serialize};

use crate::engine::pricing::driver_earning;
use crate::error::AppError;
use crate::models::order::{Order, OrderStatus};
use crate::models::user::{Role, User};

#[derive(Debug, Clone, Deserialize)]
pub struct AssistantRequest {
    pub message: String,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    Earnings,
    Deliveries,
    Tracking,
    Pricing,
    Help,
}

#[derive(Debug, Clone, Serialize)]
pub struct AssistantReply {
    pub intent: Intent,
    pub reply: String,
}

const EARNINGS_WORDS: &[&str] = &["gains", "gain", "earnings", "revenus"];
const DELIVERY_WORDS: &[&str] = &["livraisons", "livraison", "missions", "mission", "deliveries"];
const TRACKING_WORDS: &[&str] = &["suivi", "suivre", "track", "tracking", "où est", "statut"];
const PRICING_WORDS: &[&str] = &["tarif", "tarifs", "prix", "price", "pricing", "coût"];

/// True when one of `phrases` appears as whole words in `words`.
fn mentions(words: &[&str], phrases: &[&str]) -> bool {
    phrases.iter().any(|phrase| {
        let wanted: Vec<&str> = phrase.split(' ').collect();
        words.windows(wanted.len()).any(|window| window == wanted.as_slice())
    })
}

pub fn detect_intent(role: Role, message: &str) -> Intent {
    let message = message.to_lowercase();
    let words: Vec<&str> = message
        .split(|c: char| !c.is_alphanumeric())
        .filter(|word| !word.is_empty())
        .collect();

    if role == Role::Driver && mentions(&words, EARNINGS_WORDS) {
        Intent::Earnings
    } else if role == Role::Driver && mentions(&words, DELIVERY_WORDS) {
        Intent::Deliveries
    } else if role == Role::Client && mentions(&words, TRACKING_WORDS) {
        Intent::Tracking
    } else if mentions(&words, PRICING_WORDS) {
        Intent::Pricing
    } else {
        Intent::Help
    }
}

/// `orders` are the orders visible to `actor` (own orders for clients,
/// assigned orders for drivers), newest first.
pub fn answer(actor: &User, message: &str, orders: &[Order]) -> Result<AssistantReply, AppError> {
    if message.trim().is_empty() {
        return Err(AppError::BadRequest("message is required".to_string()));
    }

    let intent = detect_intent(actor.role, message);
    let reply = match intent {
        Intent::Earnings => earnings_reply(orders),
        Intent::Deliveries => deliveries_reply(orders),
        Intent::Tracking => tracking_reply(orders),
        Intent::Pricing => pricing_reply(),
        Intent::Help => help_reply(actor),
    };

    Ok(AssistantReply { intent, reply })
}

fn format_fcfa(amount: u64) -> String {
    let digits = amount.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(' ');
        }
        out.push(ch);
    }
    format!("{out} FCFA")
}

fn earnings_reply(orders: &[Order]) -> String {
    let completed: Vec<&Order> = orders
        .iter()
        .filter(|order| order.status == OrderStatus::Completed)
        .collect();
    let total: u64 = completed.iter().map(|order| driver_earning(order.price)).sum();

    format!(
        "Vos gains totaux sont de {} sur {} livraison(s) terminée(s), commission déduite.",
        format_fcfa(total),
        completed.len()
    )
}

fn deliveries_reply(orders: &[Order]) -> String {
    let active: Vec<&Order> = orders
        .iter()
        .filter(|order| order.status.is_active())
        .collect();

    if active.is_empty() {
        return "Vous n'avez pas de livraisons en cours pour le moment.".to_string();
    }

    let mut reply = String::from("Voici vos livraisons en cours :\n");
    for order in active {
        reply.push_str(&format!(
            "- Commande {} : {} à {} pour {}. Statut : {}.\n",
            order.short_ref(),
            order.description,
            order.delivery_address,
            order.recipient_name,
            order.status.as_str()
        ));
    }
    reply
}

fn tracking_reply(orders: &[Order]) -> String {
    let Some(order) = orders.first() else {
        return "Vous n'avez encore passé aucune commande.".to_string();
    };

    let status = match order.status {
        OrderStatus::Pending => "en attente d'un chauffeur",
        OrderStatus::Accepted => "acceptée par un chauffeur",
        OrderStatus::InProgress => "en cours de livraison",
        OrderStatus::Completed => "livrée",
        OrderStatus::Cancelled => "annulée",
    };

    let mut reply = format!(
        "Commande {} ({} → {}) : {}. Prix : {}.",
        order.short_ref(),
        order.from,
        order.to,
        status,
        format_fcfa(order.price)
    );
    if let Some(driver) = &order.driver_name {
        reply.push_str(&format!(" Chauffeur : {driver}."));
    }
    reply
}

fn pricing_reply() -> String {
    "Tarifs : 500 FCFA par kg (minimum 1 000 FCFA), plus les frais de trajet \
     (Yaoundé–Douala 5 000, Yaoundé–Bafoussam 3 000, Douala–Bafoussam 7 000, \
     même ville 2 000). Livraison urgente +3 000, colis fragile +1 500."
        .to_string()
}

fn help_reply(actor: &User) -> String {
    let topics = match actor.role {
        Role::Driver => "vos gains, vos livraisons en cours et les tarifs",
        Role::Client => "le suivi de votre dernière commande et les tarifs",
        Role::Admin => "les tarifs de la plateforme",
    };
    format!("Bonjour {} ! Je peux vous renseigner sur {topics}.", actor.name)
}
