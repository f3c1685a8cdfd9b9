//! Locally generated replies for when the backend cannot be reached.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use chatlink_core::MessageContext;

/// Longest prefix of the user's message echoed back.
pub const ECHO_MAX_CHARS: usize = 80;

/// Picks a template index from `(cursor, template_count)`. The result is taken
/// modulo the template count, so any value is safe.
pub type Selector = Arc<dyn Fn(usize, usize) -> usize + Send + Sync>;

struct Templates {
    apologies: &'static [&'static str],
    echo_label: &'static str,
}

const EN: Templates = Templates {
    apologies: &[
        "I'm having trouble reaching the assistant right now. Please try again in a moment.",
        "The connection to the assistant is unstable at the moment. Your message has not been lost.",
        "Sorry, the assistant is temporarily unavailable. I'll be back shortly.",
    ],
    echo_label: "You wrote",
};

const DE: Templates = Templates {
    apologies: &[
        "Ich kann den Assistenten gerade nicht erreichen. Bitte versuche es gleich noch einmal.",
        "Die Verbindung zum Assistenten ist im Moment instabil. Deine Nachricht ist nicht verloren.",
        "Entschuldigung, der Assistent ist vorübergehend nicht verfügbar. Ich bin gleich wieder da.",
    ],
    echo_label: "Du hast geschrieben",
};

const ES: Templates = Templates {
    apologies: &[
        "Tengo problemas para contactar con el asistente. Inténtalo de nuevo en un momento.",
        "La conexión con el asistente es inestable ahora mismo. Tu mensaje no se ha perdido.",
        "Lo siento, el asistente no está disponible temporalmente. Vuelvo enseguida.",
    ],
    echo_label: "Escribiste",
};

const FR: Templates = Templates {
    apologies: &[
        "Je n'arrive pas à joindre l'assistant pour le moment. Veuillez réessayer dans un instant.",
        "La connexion à l'assistant est instable en ce moment. Votre message n'est pas perdu.",
        "Désolé, l'assistant est temporairement indisponible. Je reviens vite.",
    ],
    echo_label: "Vous avez écrit",
};

fn templates_for(language: &str) -> &'static Templates {
    let primary = language
        .split(['-', '_'])
        .next()
        .unwrap_or_default()
        .to_ascii_lowercase();
    match primary.as_str() {
        "de" => &DE,
        "es" => &ES,
        "fr" => &FR,
        _ => &EN,
    }
}

/// Deterministic apology generator. Each call advances an internal cursor that
/// starts at the configured seed; a custom selector can replace the rotation.
pub struct FallbackResponder {
    cursor: AtomicUsize,
    selector: Option<Selector>,
}

impl FallbackResponder {
    pub fn new(seed: usize) -> Self {
        Self {
            cursor: AtomicUsize::new(seed),
            selector: None,
        }
    }

    pub fn with_selector(seed: usize, selector: Selector) -> Self {
        Self {
            cursor: AtomicUsize::new(seed),
            selector: Some(selector),
        }
    }

    /// Build a reply for `message`. Never empty, never panics.
    pub fn generate(&self, message: &str, context: &MessageContext) -> String {
        let templates = templates_for(context.language());
        let count = templates.apologies.len();
        let cursor = self.cursor.fetch_add(1, Ordering::Relaxed);
        let index = match &self.selector {
            Some(select) => select(cursor, count),
            None => cursor,
        } % count;

        let apology = templates.apologies[index];
        match echo(message) {
            Some(echoed) => format!("{apology}\n\n{}: \"{echoed}\"", templates.echo_label),
            None => apology.to_string(),
        }
    }
}

impl Default for FallbackResponder {
    fn default() -> Self {
        Self::new(0)
    }
}

fn echo(message: &str) -> Option<String> {
    let flat: String = message.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.is_empty() {
        return None;
    }
    if flat.chars().count() <= ECHO_MAX_CHARS {
        return Some(flat);
    }
    let cut: String = flat.chars().take(ECHO_MAX_CHARS).collect();
    Some(format!("{}…", cut.trim_end()))
}
