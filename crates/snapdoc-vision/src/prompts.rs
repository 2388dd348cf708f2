//! Prompt construction for the gateway analyzer.

/// Default question for free-form description.
pub const DESCRIBE_DEFAULT: &str = "Describe what you see in this image in detail.";

/// Prompt asking the model to locate `target` within an image of the
/// given pixel dimensions.
///
/// The padding instruction matters: without it models return tight
/// boxes that crop labels and axis text off charts.
pub fn locate_prompt(target: &str, image_width: u32, image_height: u32) -> String {
    format!(
        r#"I need you to locate a specific element in this screenshot.

Target to find: "{target}"

The image dimensions are {image_width}x{image_height} pixels.

Return a JSON object with the following structure:
{{
  "found": true/false,
  "description": "brief description of what you found",
  "regions": [
    {{
      "label": "name of the element",
      "left": <pixel x of top-left corner>,
      "top": <pixel y of top-left corner>,
      "width": <pixel width>,
      "height": <pixel height>,
      "confidence": <0.0 to 1.0>
    }}
  ]
}}

IMPORTANT:
- Coordinates must be in absolute pixels based on the {image_width}x{image_height} image.
- Add generous padding (50-100px) around the element so it looks good when cropped.
- If you find multiple matching elements, return all of them sorted by confidence.
- Return ONLY the JSON, no other text."#
    )
}

/// Prompt asking the model to plan from the instruction text alone,
/// before any image exists.
pub fn plan_prompt(instruction: &str) -> String {
    format!(
        r#"You are a smart file assistant that can:
1. Take screenshots of the screen
2. Analyze and crop specific regions from screenshots
3. Paste images into documents (DOCX, PPTX, Markdown)

The user said: "{instruction}"

Decide what to do. Return a JSON object:
{{
  "needs_screenshot": true/false,
  "target_element": "<what to look for on screen, or null>",
  "target_document": "<output file path>",
  "target_format": "<docx/pptx/md>",
  "position": {{"paragraph": N}} or {{"slide": N}} or {{"after_heading": "text"}} or null,
  "size": {{"width": 6.0}} or null,
  "reasoning": "<your understanding of the task>"
}}

If you cannot determine the target document from the instruction, set it to "output.docx".
Return ONLY the JSON, no other text."#
    )
}
