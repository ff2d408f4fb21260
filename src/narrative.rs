//! Rule-based motivational text and the prompt for an external narrative
//!
//! [`compose`] is a local alternative to a language-model narrative: one
//! canned message per category, always in the order BMI, heart rate, sleep,
//! activity, closing.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Serialize;

/// Title printed above the narrative page body
pub const NARRATIVE_TITLE: &str = "🧠 Résumé & Conseils Personnalisés";

const CLOSING: &str = "🚀 **Conclusion :** continuez comme ça. Mangez bien. Buvez de l’eau. Soyez le boss de votre bien-être.";

/// The handful of metrics the narrative talks about
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct NarrativeSummary {
    pub bmi: Decimal,
    pub heart_rate: Decimal,
    pub sleep_hours: Decimal,
    pub steps: Decimal,
}

fn bmi_message(bmi: Decimal) -> &'static str {
    if bmi < dec!(18.5) {
        "🦴 Vous êtes un peu léger·ère ! Ajoutez du carburant à cette fusée corporelle. Plus de calories, plus d'énergie, GO ! 💪"
    } else if bmi < dec!(25) {
        "🥗 Votre IMC est parfait ! Vous êtes aussi équilibré·e qu’une salade bio en méditation."
    } else if bmi < dec!(30) {
        "⚖️ Légèrement au-dessus ? Rien d'alarmant ! On se bouge un peu, on mange smart, et hop, retour à la zone verte."
    } else {
        "🔥 Mission brûlage de gras enclenchée ! Pas de panique, chaque jour est une nouvelle chance. Allez, ON Y VA !"
    }
}

fn heart_rate_message(bpm: Decimal) -> &'static str {
    if bpm < dec!(60) {
        "🧘‍♂️ Fréquence cardiaque de moine Shaolin détectée. Zen extrême. Trop cool."
    } else if bpm <= dec!(100) {
        "❤️ Fréquence cardiaque ? Royal. Votre cœur bat au rythme d’un tambour zen."
    } else {
        "⚡️ Cœur en mode turbo ! Peut-être trop de café ou trop d'amour ? Dans tous les cas, check-up conseillé."
    }
}

fn sleep_message(hours: Decimal) -> &'static str {
    if hours < dec!(6) {
        "😵 Moins de 6h de sommeil ?! Bro, tu veux devenir zombie ? Au lit plus tôt ce soir, et que ça saute !"
    } else if hours <= dec!(9) {
        "😴 Vous dormez comme un koala sous sédatif. Récupération niveau pro."
    } else {
        "⏰ Vous dormez beaucoup... recharge complète activée. Veillez juste à ne pas rater le matin !"
    }
}

fn steps_message(steps: Decimal) -> &'static str {
    if steps < dec!(4000) {
        "🛋️ Alerte canapé ! Levez-vous, bougez, mettez du feu dans vos semelles !"
    } else if steps < dec!(8000) {
        "🚶 Activité modérée. C’est bien, mais on veut du **🔥🔥🔥** !"
    } else {
        "🏃 Activité physique : vous êtes une machine de guerre ! Continuez à marcher comme si vous conquériez le monde."
    }
}

/// Select one message per category and join them with blank lines
pub fn compose(summary: &NarrativeSummary) -> String {
    [
        bmi_message(summary.bmi),
        heart_rate_message(summary.heart_rate),
        sleep_message(summary.sleep_hours),
        steps_message(summary.steps),
        CLOSING,
    ]
    .join("\n\n")
}

/// Prompt pair handed to the language-model collaborator
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Prompt {
    pub system: String,
    pub user: String,
}

/// Builds the narrative prompt from key metrics
#[derive(Debug, Clone)]
pub struct PromptBuilder {
    system: String,
}

impl Default for PromptBuilder {
    fn default() -> Self {
        PromptBuilder {
            system: "Tu es un assistant santé bienveillant. Tu ne poses pas de diagnostic \
                     médical et tu recommandes de consulter un professionnel en cas de doute."
                .to_string(),
        }
    }
}

impl PromptBuilder {
    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = system.into();
        self
    }

    pub fn build(&self, summary: &NarrativeSummary) -> Prompt {
        let user = format!(
            "Voici les données de santé :\n\
             - IMC : {:.1}\n\
             - Fréquence cardiaque : {:.0}\n\
             - Pas quotidiens : {}\n\
             - Sommeil : {:.1} h\n\
             \n\
             Donne un résumé santé + conseils personnalisés en français.",
            summary.bmi,
            summary.heart_rate,
            summary.steps.round(),
            summary.sleep_hours,
        );

        Prompt {
            system: self.system.clone(),
            user,
        }
    }
}
