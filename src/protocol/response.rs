//! Response wrapper with convenience accessors over the handler's JSON.

use serde_json::Value;

/// The handler's JSON result, wrapped for inspection in tests.
#[derive(Debug, Clone)]
pub struct SkillResponse {
    raw: Value,
}

impl SkillResponse {
    pub fn new(raw: Value) -> Self {
        SkillResponse { raw }
    }

    pub fn raw(&self) -> &Value {
        &self.raw
    }

    pub fn into_raw(self) -> Value {
        self.raw
    }

    /// Spoken prompt: SSML when present, plain text otherwise.
    pub fn prompt(&self) -> Option<&str> {
        speech_text(&self.raw["response"]["outputSpeech"])
    }

    pub fn reprompt(&self) -> Option<&str> {
        speech_text(&self.raw["response"]["reprompt"]["outputSpeech"])
    }

    pub fn should_end_session(&self) -> Option<bool> {
        self.raw["response"]["shouldEndSession"].as_bool()
    }

    pub fn card(&self) -> Option<&Value> {
        let card = &self.raw["response"]["card"];
        card.is_object().then_some(card)
    }

    pub fn card_title(&self) -> Option<&str> {
        self.card()?["title"].as_str()
    }

    pub fn card_content(&self) -> Option<&str> {
        let card = self.card()?;
        card["content"].as_str().or_else(|| card["text"].as_str())
    }

    pub fn card_image_url(&self) -> Option<&str> {
        let image = &self.card()?["image"];
        image["largeImageUrl"]
            .as_str()
            .or_else(|| image["smallImageUrl"].as_str())
    }

    pub fn directives(&self) -> &[Value] {
        self.raw["response"]["directives"]
            .as_array()
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// First directive with the given type string.
    pub fn directive(&self, directive_type: &str) -> Option<&Value> {
        self.directives()
            .iter()
            .find(|d| d["type"].as_str() == Some(directive_type))
    }

    pub fn attr(&self, name: &str) -> Option<&Value> {
        self.raw["sessionAttributes"].get(name)
    }

    pub fn attrs(&self) -> Option<&Value> {
        let attrs = &self.raw["sessionAttributes"];
        attrs.is_object().then_some(attrs)
    }

    /// The Display.RenderTemplate template, if one was returned.
    pub fn display(&self) -> Option<&Value> {
        self.directive("Display.RenderTemplate")
            .map(|d| &d["template"])
    }

    pub fn primary_text(&self, list_token: Option<&str>) -> Option<&str> {
        self.display_text("primaryText", list_token)
    }

    pub fn secondary_text(&self, list_token: Option<&str>) -> Option<&str> {
        self.display_text("secondaryText", list_token)
    }

    pub fn tertiary_text(&self, list_token: Option<&str>) -> Option<&str> {
        self.display_text("tertiaryText", list_token)
    }

    /// Text from the display template: either the template's own text
    /// content, or the content of the list item with the given token.
    fn display_text(&self, field: &str, list_token: Option<&str>) -> Option<&str> {
        let template = self.display()?;
        let content = match list_token {
            None => &template["textContent"],
            Some(token) => {
                let items = template["listItems"].as_array()?;
                let item = items
                    .iter()
                    .find(|item| item["token"].as_str() == Some(token))?;
                &item["textContent"]
            }
        };
        content[field]["text"].as_str()
    }
}

fn speech_text(speech: &Value) -> Option<&str> {
    speech["ssml"].as_str().or_else(|| speech["text"].as_str())
}
