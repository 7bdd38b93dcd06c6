//! Text persistence for transform groups.
//!
//! One transform per line, `<TypeName> <count>; p1, p2, ..., pN`, with no
//! newline after the last line. The type name selects the transform kind
//! on load and `count` must match the number of values.

use anyhow::{bail, Context, Result};
use seqreg_core::{Transform2D, TransformGroup};
use std::fs;
use std::path::Path;
use tracing::{debug, error};

/// Format one transform as a single line.
pub fn format_transform(transform: &Transform2D) -> String {
    let parameters = transform.parameters();
    let values: Vec<String> = parameters.iter().map(|p| p.to_string()).collect();
    format!(
        "{} {}; {}",
        transform.type_name(),
        parameters.len(),
        values.join(", ")
    )
}

/// Format a whole group, one line per transform.
pub fn format_transform_group(group: &TransformGroup) -> String {
    group
        .iter()
        .map(format_transform)
        .collect::<Vec<_>>()
        .join("\n")
}

/// Parse a single transform line.
pub fn parse_transform(line: &str) -> Result<Transform2D> {
    let (header, values) = line
        .split_once(';')
        .with_context(|| format!("Missing ';' in transform line {:?}", line))?;

    let mut fields = header.split_whitespace();
    let name = fields.next().context("Missing transform type name")?;
    let count: usize = fields
        .next()
        .context("Missing parameter count")?
        .parse()
        .with_context(|| format!("Invalid parameter count in {:?}", header))?;
    if let Some(extra) = fields.next() {
        bail!("Unexpected token {:?} after parameter count", extra);
    }

    let parameters = if values.trim().is_empty() {
        Vec::new()
    } else {
        values
            .split(',')
            .map(|v| {
                v.trim()
                    .parse::<f64>()
                    .with_context(|| format!("Invalid parameter value {:?}", v.trim()))
            })
            .collect::<Result<Vec<f64>>>()?
    };
    if parameters.len() != count {
        bail!(
            "Transform {} declares {} parameters but {} follow",
            name,
            count,
            parameters.len()
        );
    }

    Transform2D::from_type_name(name, &parameters)
        .with_context(|| format!("Transform {} cannot take {} parameters", name, count))
}

/// Parse every line of `text`, failing on the first malformed one.
///
/// Blank lines are ignored.
pub fn parse_transform_group(text: &str) -> Result<TransformGroup> {
    text.lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(i, line)| parse_transform(line).with_context(|| format!("Line {}", i + 1)))
        .collect()
}

/// Write `group` to `path`.
///
/// The file is only touched once the whole group has been formatted.
pub fn save_transform_group<P: AsRef<Path>>(path: P, group: &TransformGroup) -> Result<()> {
    let path = path.as_ref();
    let text = format_transform_group(group);
    fs::write(path, text)
        .with_context(|| format!("Failed to write transform file {}", path.display()))
        .map_err(|e| {
            error!(error = %format!("{:#}", e), "saving transforms failed");
            e
        })?;
    debug!(path = %path.display(), transforms = group.len(), "transforms saved");
    Ok(())
}

/// Read a transform file, failing on any malformed line.
pub fn read_transform_group<P: AsRef<Path>>(path: P) -> Result<TransformGroup> {
    let path = path.as_ref();
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read transform file {}", path.display()))?;
    parse_transform_group(&text)
        .with_context(|| format!("Malformed transform file {}", path.display()))
}

/// Read a transform file, keeping whatever parses before the first error.
///
/// Errors are logged; an unreadable file yields an empty group.
pub fn load_transform_group<P: AsRef<Path>>(path: P) -> TransformGroup {
    let path = path.as_ref();
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) => {
            error!(path = %path.display(), error = %e, "failed to read transform file");
            return TransformGroup::new();
        }
    };

    let mut group = TransformGroup::new();
    for (i, line) in text.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        match parse_transform(line) {
            Ok(transform) => group.push(transform),
            Err(e) => {
                error!(
                    path = %path.display(),
                    line = i + 1,
                    error = %format!("{:#}", e),
                    "malformed transform line, keeping {} transforms",
                    group.len()
                );
                break;
            }
        }
    }
    group
}

#[cfg(test)]
mod tests {
    use super::*;
    use seqreg_core::spatial::{Point2, Vector2};
    use seqreg_core::{Rigid2DTransform, Translation2DTransform};

    #[test]
    fn test_format_rigid() {
        let t = Transform2D::Rigid2D(Rigid2DTransform::new(
            0.0,
            Point2::new(0.0, 0.0),
            Vector2::new(11.0, 12.0),
        ));
        assert_eq!(format_transform(&t), "Rigid2D 5; 0, 0, 0, 11, 12");
    }

    #[test]
    fn test_format_group_has_no_trailing_newline() {
        let group = TransformGroup::from_transforms(vec![
            Transform2D::identity(),
            Transform2D::Translation2D(Translation2DTransform::new(Vector2::new(1.5, -2.0))),
        ]);
        assert_eq!(
            format_transform_group(&group),
            "Rigid2D 5; 0, 0, 0, 0, 0\nTranslation2D 2; 1.5, -2"
        );
    }

    #[test]
    fn test_parse_honours_type_tag() {
        let t = parse_transform("Translation2D 2; 3, -4.25").unwrap();
        assert_eq!(t.type_name(), "Translation2D");
        assert_eq!(t.parameters(), vec![3.0, -4.25]);
    }

    #[test]
    fn test_parse_unknown_name_as_rigid() {
        let t = parse_transform("CenteredRigid2DTransform 5; 0, 0, 0, 11, 12").unwrap();
        assert_eq!(t.type_name(), "Rigid2D");
        assert_eq!(t.parameters(), vec![0.0, 0.0, 0.0, 11.0, 12.0]);
        assert!(parse_transform("Affine2D 2; 1, 2").is_err());
    }

    #[test]
    fn test_parse_rejects_malformed_lines() {
        assert!(parse_transform("Rigid2D 5 0, 0, 0, 0, 0").is_err());
        assert!(parse_transform("Rigid2D 4; 0, 0, 0, 0, 0").is_err());
        assert!(parse_transform("Rigid2D 5; 0, 0, x, 0, 0").is_err());
        assert!(parse_transform("Translation2D 5; 1, 2, 3, 4, 5").is_err());
        assert!(parse_transform("; 1, 2").is_err());
    }

    #[test]
    fn test_parse_group_reports_line() {
        let err = parse_transform_group("Translation2D 2; 1, 2\nbroken").unwrap_err();
        assert!(format!("{:#}", err).contains("Line 2"));
    }
}
