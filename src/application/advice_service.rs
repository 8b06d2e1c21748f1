// Health advice - prompt assembly over a text-completion backend
use crate::application::providers::{AdviceGenerator, ProviderError};
use serde::Deserialize;
use std::sync::Arc;
use tracing::debug;

#[derive(Debug, Clone, Deserialize)]
pub struct AdviceRequest {
    #[serde(default)]
    pub symptoms: Vec<String>,
    #[serde(default)]
    pub aqi: i32,
    #[serde(default)]
    pub age: Option<i32>,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub conditions: Vec<String>,
    #[serde(default)]
    pub addictions: Vec<String>,
}

pub struct AdviceService {
    generator: Arc<dyn AdviceGenerator>,
}

impl AdviceService {
    pub fn new(generator: Arc<dyn AdviceGenerator>) -> Self {
        Self { generator }
    }

    pub async fn advise(&self, request: &AdviceRequest) -> Result<String, ProviderError> {
        let prompt = build_prompt(request);
        debug!("advice prompt: {}", prompt);

        let response = self.generator.generate(&prompt).await?;
        // Bracketed responses are the backend's own error markers.
        if response.trim().is_empty() || response.trim_start().starts_with('[') {
            return Err(ProviderError::Payload(
                "advice backend returned no usable text".to_string(),
            ));
        }
        Ok(response)
    }
}

fn list_or_none(items: &[String]) -> String {
    if items.is_empty() {
        "none".to_string()
    } else {
        items.join(", ")
    }
}

fn build_prompt(request: &AdviceRequest) -> String {
    let symptoms = list_or_none(&request.symptoms);
    let conditions = list_or_none(&request.conditions);
    let addictions = list_or_none(&request.addictions);
    let notes = if request.notes.is_empty() { "none" } else { request.notes.as_str() };

    let has_symptoms = !request.symptoms.is_empty();
    let has_conditions = !request.conditions.is_empty() && request.conditions != ["None"];
    let has_addictions = !request.addictions.is_empty() && request.addictions != ["None"];
    let age = request
        .age
        .map(|a| a.to_string())
        .unwrap_or_else(|| "unknown".to_string());

    format!(
        "You are Vayu, a kind and smart AI health assistant. Your task is to provide health tips to people based on their submitted information. \
        You must write the advice in exactly 5 parts, using simple and clear language. Please use a few relevant emojis (like 🩺, ❤️, ✨, 🚭, 🍷, 📱) to make the advice feel friendly and engaging. Here are the parts you must include:\n\
        1. A 'Quick Analysis' of the situation.\n\
        2. 'What You Can Do Now' with 2-3 immediate actions.\n\
        3. 'Air Quality Precautions' explaining how the air quality affects them.\n\
        4. 'Addiction Impact Analysis' - Explain how their addictions might be affecting their symptoms and health, and provide specific advice for managing these addictions in relation to air quality and their current symptoms.\n\
        5. 'When to See a Doctor' outlining specific warning signs.\n\n\
        --- User Information ---\n\
        Age: {age}\n\
        Health Problems: {conditions}\n\
        Symptoms: {symptoms}\n\
        Addictions: {addictions}\n\
        Notes: {notes}\n\
        Air Quality (AQI): {aqi}\n\
        --- End of Information ---\n\n\
        IMPORTANT INSTRUCTIONS:\n\
        - User has symptoms: {has_symptoms}\n\
        - User has health conditions: {has_conditions}\n\
        - User has addictions: {has_addictions}\n\n\
        For the Addiction Impact Analysis section, provide detailed analysis for each addiction mentioned:\n\
        - **Smoking**: Impact on respiratory health, interaction with air quality, harm reduction strategies\n\
        - **Alcohol**: Effects on immune system, dehydration, interaction with medications\n\
        - **Caffeine**: Impact on heart rate, sleep, anxiety, interaction with air quality symptoms\n\
        - **Sugar**: Effects on inflammation, immune response, energy levels\n\
        - **Social Media**: Impact on mental health, sleep patterns, stress levels, eye strain\n\
        - **Gaming**: Effects on posture, eye health, sleep, stress management\n\
        - **Gambling**: Impact on stress, financial health, mental well-being\n\n\
        If no symptoms are selected, focus on preventive advice and addiction management rather than symptom-specific advice.\n\
        If no addictions are selected, mention that maintaining healthy habits is beneficial for overall well-being.\n\n\
        Now, please provide your advice based on this information.",
        age = age,
        conditions = conditions,
        symptoms = symptoms,
        addictions = addictions,
        notes = notes,
        aqi = request.aqi,
        has_symptoms = has_symptoms,
        has_conditions = has_conditions,
        has_addictions = has_addictions,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    struct CannedGenerator {
        reply: String,
    }

    #[async_trait]
    impl AdviceGenerator for CannedGenerator {
        async fn generate(&self, _prompt: &str) -> Result<String, ProviderError> {
            Ok(self.reply.clone())
        }
    }

    fn request() -> AdviceRequest {
        AdviceRequest {
            symptoms: vec!["cough".to_string()],
            aqi: 180,
            age: Some(34),
            notes: String::new(),
            conditions: Vec::new(),
            addictions: vec!["Smoking".to_string()],
        }
    }

    #[test]
    fn test_prompt_carries_user_information() {
        let prompt = build_prompt(&request());
        assert!(prompt.contains("Age: 34"));
        assert!(prompt.contains("Symptoms: cough"));
        assert!(prompt.contains("Air Quality (AQI): 180"));
        assert!(prompt.contains("User has addictions: true"));
        assert!(prompt.contains("Health Problems: none"));
    }

    #[test]
    fn test_placeholder_condition_list_counts_as_none() {
        let mut req = request();
        req.addictions = vec!["None".to_string()];
        let prompt = build_prompt(&req);
        assert!(prompt.contains("User has addictions: false"));
    }

    #[tokio::test]
    async fn test_advise_returns_backend_text() {
        let service = AdviceService::new(Arc::new(CannedGenerator {
            reply: "Stay indoors today.".to_string(),
        }));
        let advice = service.advise(&request()).await.unwrap();
        assert_eq!(advice, "Stay indoors today.");
    }

    #[tokio::test]
    async fn test_advise_rejects_error_markers() {
        let service = AdviceService::new(Arc::new(CannedGenerator {
            reply: "[backend failed]".to_string(),
        }));
        assert!(service.advise(&request()).await.is_err());
    }

    #[tokio::test]
    async fn test_advise_rejects_blank_output() {
        let service = AdviceService::new(Arc::new(CannedGenerator {
            reply: "   ".to_string(),
        }));
        assert!(service.advise(&request()).await.is_err());
    }
}
