//! Script templates with typed placeholders.
//!
//! Service definitions write placeholders as printf-style tokens (`%s`, `%d`,
//! `%f`, `%b`). What a token means depends on the template it appears in, so
//! each template is parsed once, at registration, against its [`TemplateRole`].
//! Rendering then walks the parsed segments and never inspects the source text
//! again.

use std::fmt;

use crate::error::TemplateError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlaceholderKind {
    ContentId,
    /// Integer volume in `0..=100`.
    VolumePercent,
    /// Decimal volume in `0.0..=1.0`.
    VolumeFraction,
    Seconds,
    Livestream,
}

impl fmt::Display for PlaceholderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PlaceholderKind::ContentId => "content-id",
            PlaceholderKind::VolumePercent => "volume-percent",
            PlaceholderKind::VolumeFraction => "volume-fraction",
            PlaceholderKind::Seconds => "seconds",
            PlaceholderKind::Livestream => "livestream",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemplateRole {
    Url,
    SetVolume,
    Start,
    Seek,
    LiveState,
}

impl TemplateRole {
    pub fn name(&self) -> &'static str {
        match self {
            TemplateRole::Url => "url",
            TemplateRole::SetVolume => "set-volume",
            TemplateRole::Start => "start",
            TemplateRole::Seek => "seek",
            TemplateRole::LiveState => "live-state",
        }
    }

    fn kind_for(&self, token: char) -> Option<PlaceholderKind> {
        use PlaceholderKind::*;

        match (self, token) {
            (TemplateRole::Url, 's') => Some(ContentId),
            (TemplateRole::SetVolume, 'd') => Some(VolumePercent),
            (TemplateRole::SetVolume, 'f') => Some(VolumeFraction),
            (TemplateRole::Start, 's') => Some(ContentId),
            (TemplateRole::Start, 'b') => Some(Livestream),
            (TemplateRole::Seek, 'd') => Some(Seconds),
            (TemplateRole::LiveState, 's') => Some(ContentId),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Segment {
    Literal(String),
    Placeholder(PlaceholderKind),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScriptTemplate {
    role: TemplateRole,
    source: String,
    segments: Vec<Segment>,
}

impl ScriptTemplate {
    pub fn parse(role: TemplateRole, source: &str) -> Result<Self, TemplateError> {
        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut chars = source.chars().peekable();

        while let Some(c) = chars.next() {
            if c != '%' {
                literal.push(c);
                continue;
            }

            match chars.peek().copied() {
                Some('%') => {
                    chars.next();
                    literal.push('%');
                }
                Some(token @ ('s' | 'd' | 'f' | 'b')) => {
                    chars.next();
                    let kind = role.kind_for(token).ok_or(TemplateError::UnexpectedPlaceholder {
                        role: role.name(),
                        token,
                    })?;
                    if !literal.is_empty() {
                        segments.push(Segment::Literal(std::mem::take(&mut literal)));
                    }
                    segments.push(Segment::Placeholder(kind));
                }
                // A lone '%' is script text, e.g. the modulo operator.
                _ => literal.push('%'),
            }
        }

        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }

        let template = Self {
            role,
            source: source.to_string(),
            segments,
        };

        if template.contains(PlaceholderKind::VolumePercent)
            && template.contains(PlaceholderKind::VolumeFraction)
        {
            return Err(TemplateError::MixedVolumeEncodings);
        }

        Ok(template)
    }

    pub fn role(&self) -> TemplateRole {
        self.role
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn placeholders(&self) -> impl Iterator<Item = PlaceholderKind> + '_ {
        self.segments.iter().filter_map(|segment| match segment {
            Segment::Placeholder(kind) => Some(*kind),
            Segment::Literal(_) => None,
        })
    }

    pub fn contains(&self, kind: PlaceholderKind) -> bool {
        self.placeholders().any(|k| k == kind)
    }

    /// Substitute every placeholder, left to right.
    pub fn render(&self, values: &ScriptValues<'_>) -> Result<String, TemplateError> {
        let mut out = String::with_capacity(self.source.len() + 16);

        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Placeholder(kind) => values.write(*kind, &mut out)?,
            }
        }

        Ok(out)
    }
}

/// Values available to a single render call.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScriptValues<'a> {
    content_id: Option<&'a str>,
    volume: Option<f32>,
    seconds: Option<u64>,
    livestream: Option<bool>,
}

impl<'a> ScriptValues<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn content_id(mut self, id: &'a str) -> Self {
        self.content_id = Some(id);
        self
    }

    /// Volume as a fraction; it is clamped into `0.0..=1.0` when rendered.
    pub fn volume(mut self, fraction: f32) -> Self {
        self.volume = Some(fraction);
        self
    }

    pub fn seconds(mut self, seconds: u64) -> Self {
        self.seconds = Some(seconds);
        self
    }

    pub fn livestream(mut self, livestream: bool) -> Self {
        self.livestream = Some(livestream);
        self
    }

    fn write(&self, kind: PlaceholderKind, out: &mut String) -> Result<(), TemplateError> {
        let missing = || TemplateError::MissingValue(kind);

        match kind {
            PlaceholderKind::ContentId => out.push_str(self.content_id.ok_or_else(missing)?),
            PlaceholderKind::VolumePercent => {
                out.push_str(&volume_percent(self.volume.ok_or_else(missing)?).to_string())
            }
            PlaceholderKind::VolumeFraction => {
                let fraction = clamp_volume(self.volume.ok_or_else(missing)?);
                out.push_str(&format!("{fraction:.6}"))
            }
            PlaceholderKind::Seconds => out.push_str(&self.seconds.ok_or_else(missing)?.to_string()),
            PlaceholderKind::Livestream => {
                out.push_str(&self.livestream.ok_or_else(missing)?.to_string())
            }
        }

        Ok(())
    }
}

pub fn clamp_volume(fraction: f32) -> f32 {
    if fraction.is_nan() {
        0.0
    } else {
        fraction.clamp(0.0, 1.0)
    }
}

/// Rounded rather than truncated, so a low setting like 0.006 is not muted.
pub fn volume_percent(fraction: f32) -> u8 {
    (clamp_volume(fraction) * 100.0).round() as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percent_volume_rounds_and_clamps() {
        let t = ScriptTemplate::parse(TemplateRole::SetVolume, "player.setVolume(%d);").unwrap();

        let render = |v: f32| t.render(&ScriptValues::new().volume(v)).unwrap();
        assert_eq!(render(0.5), "player.setVolume(50);");
        assert_eq!(render(0.006), "player.setVolume(1);");
        assert_eq!(render(0.289), "player.setVolume(29);");
        assert_eq!(render(1.7), "player.setVolume(100);");
        assert_eq!(render(-0.2), "player.setVolume(0);");
        assert_eq!(render(f32::NAN), "player.setVolume(0);");

        for (fraction, percent) in [(0.0, 0), (0.004, 0), (0.125, 13), (0.33, 33), (0.999, 100), (1.0, 100)] {
            assert_eq!(volume_percent(fraction), percent, "fraction {fraction}");
        }
    }

    #[test]
    fn fraction_volume_uses_dot_decimal() {
        let t = ScriptTemplate::parse(TemplateRole::SetVolume, "video.volume = %f;").unwrap();
        let script = t.render(&ScriptValues::new().volume(0.25)).unwrap();
        assert_eq!(script, "video.volume = 0.250000;");
        assert!(!script.contains(','));
    }

    #[test]
    fn start_template_substitutes_id_then_livestream() {
        let t = ScriptTemplate::parse(TemplateRole::Start, "start('%s', %b);").unwrap();
        assert_eq!(
            t.placeholders().collect::<Vec<_>>(),
            vec![PlaceholderKind::ContentId, PlaceholderKind::Livestream]
        );

        let script = t
            .render(&ScriptValues::new().content_id("abc").livestream(false))
            .unwrap();
        assert_eq!(script, "start('abc', false);");
    }

    #[test]
    fn missing_value_is_reported() {
        let t = ScriptTemplate::parse(TemplateRole::Seek, "seekTo(%d)").unwrap();
        assert_eq!(
            t.render(&ScriptValues::new()),
            Err(TemplateError::MissingValue(PlaceholderKind::Seconds))
        );
        assert_eq!(t.render(&ScriptValues::new().seconds(30)).unwrap(), "seekTo(30)");
    }

    #[test]
    fn template_without_placeholders_ignores_values() {
        let t = ScriptTemplate::parse(TemplateRole::Start, "document.querySelector('video').play();").unwrap();
        assert_eq!(t.placeholders().count(), 0);
        assert_eq!(
            t.render(&ScriptValues::new()).unwrap(),
            "document.querySelector('video').play();"
        );
    }

    #[test]
    fn percent_escapes_and_stray_percent_are_literal() {
        let t = ScriptTemplate::parse(TemplateRole::Seek, "t = (%d %% 60) + x % y;").unwrap();
        assert_eq!(
            t.render(&ScriptValues::new().seconds(75)).unwrap(),
            "t = (75 % 60) + x % y;"
        );
    }

    #[test]
    fn registration_rejects_bad_placeholders() {
        assert_eq!(
            ScriptTemplate::parse(TemplateRole::SetVolume, "a(%d); b(%f);"),
            Err(TemplateError::MixedVolumeEncodings)
        );
        assert_eq!(
            ScriptTemplate::parse(TemplateRole::Seek, "seek('%s')"),
            Err(TemplateError::UnexpectedPlaceholder { role: "seek", token: 's' })
        );
    }
}
