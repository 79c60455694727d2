#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageStyle {
    pub label: &'static str,
    pub value: &'static str,
    pub prompt: &'static str,
}

pub const IMAGE_STYLES: &[ImageStyle] = &[
    ImageStyle {
        label: "Pop Art",
        value: "pop-art",
        prompt: "Create an image in the bold and vibrant style of classic pop art, using bright primary colors, thick outlines, and a playful comic book flair. Incorporate stylized, mass-produced imagery or dotted shading for added impact.",
    },
    ImageStyle {
        label: "Minimal",
        value: "minimal",
        prompt: "Generate a simple, clean composition with limited shapes and subtle color accents. Emphasize negative space and precise lines to achieve an elegant, understated look.",
    },
    ImageStyle {
        label: "Retro",
        value: "retro",
        prompt: "Design a vintage-inspired scene with nostalgic color palettes, distressed textures, and bold mid-century typography. Capture the essence of old posters, ads, or signs for an authentic throwback vibe.",
    },
    ImageStyle {
        label: "Watercolor",
        value: "watercolor",
        prompt: "Produce a delicate, painterly image emulating fluid watercolor strokes and soft gradients. Blend pastel hues and dreamy splashes to create a light, handcrafted feel.",
    },
    ImageStyle {
        label: "Fantasy",
        value: "fantasy",
        prompt: "Illustrate a whimsical realm filled with magical creatures, enchanted forests, and otherworldly elements. Use vibrant colors and ornate detailing to evoke a sense of wonder and adventure.",
    },
    ImageStyle {
        label: "Moody",
        value: "moody",
        prompt: "Craft an atmospheric scene defined by dramatic lighting, deep shadows, and rich textures. Evoke emotion with subdued color tones and an underlying sense of tension.",
    },
    ImageStyle {
        label: "Vibrant",
        value: "vibrant",
        prompt: "Generate an energetic, eye-popping design with bold, saturated hues and dynamic contrasts. Layer vivid gradients and striking shapes for a lively, high-impact result.",
    },
    ImageStyle {
        label: "Cinematic",
        value: "cinematic",
        prompt: "Compose a visually stunning frame reminiscent of a movie still, complete with dramatic lighting and evocative color grading. Convey a strong sense of story through expressive angles and rich detail.",
    },
    ImageStyle {
        label: "Cyberpunk",
        value: "cyberpunk",
        prompt: "Envision a futuristic, neon-lit cityscape infused with advanced technology and dystopian undertones. Layer towering skyscrapers, holographic signage, and edgy urban elements for a gritty, high-tech aesthetic.",
    },
    ImageStyle {
        label: "Surreal",
        value: "Surreal",
        prompt: "Construct a dreamlike world blending unexpected, fantastical elements in bizarre yet captivating ways. Use vivid colors and warped perspectives to create an otherworldly, mind-bending atmosphere.",
    },
    ImageStyle {
        label: "Art Deco",
        value: "art-deco",
        prompt: "Design a scene characterized by bold geometric shapes, streamlined forms, and luxe metallic accents. Channel the sophistication of the 1920s and 1930s with glamorous patterns and elegant symmetry.",
    },
    ImageStyle {
        label: "Grafiti",
        value: "grafiti",
        prompt: "Produce an urban-inspired piece rich with spray paint textures, edgy lettering, and vibrant color bursts. Layer paint drips, splatters, and bold typography for a raw, street-art aesthetic.",
    },
];

pub fn find_style(value: &str) -> Option<&'static ImageStyle> {
    IMAGE_STYLES.iter().find(|style| style.value == value)
}

pub fn style_prompt(value: &str) -> &'static str {
    find_style(value).map(|style| style.prompt).unwrap_or("")
}

pub fn supported_styles() -> Vec<(&'static str, &'static str)> {
    IMAGE_STYLES
        .iter()
        .map(|style| (style.value, style.label))
        .collect()
}
