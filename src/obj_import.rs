//! Minimal Wavefront OBJ mesh import: positions and faces only. No
//! materials, normals, or UVs are read from the file; the caller supplies
//! the material the whole mesh is built with.

use std::fs;
use std::path::Path;

use glam::Vec3;

use crate::error::ImportError;
use crate::material::Material;
use crate::primitive::Mesh;
use crate::triangle::Triangle;

/// Parses `path` as an OBJ file and builds a single `Mesh` from every face,
/// all sharing `material`. Faces are fan-triangulated if they have more
/// than three vertices.
pub fn load_mesh(path: &Path, material: Material) -> Result<Mesh, ImportError> {
    let text = fs::read_to_string(path).map_err(|source| ImportError::Io { path: path.to_path_buf(), source })?;

    let mut positions = Vec::new();
    let mut triangles = Vec::new();

    for (line_no, raw_line) in text.lines().enumerate() {
        let line = line_no + 1;
        let line_text = raw_line.trim();
        if line_text.is_empty() || line_text.starts_with('#') {
            continue;
        }
        let mut tokens = line_text.split_whitespace();
        let Some(tag) = tokens.next() else { continue };

        match tag {
            "v" => {
                let coords: Vec<f32> = tokens
                    .by_ref()
                    .take(3)
                    .map(|tok| parse_float(path, line, "v", tok))
                    .collect::<Result<_, _>>()?;
                if coords.len() != 3 {
                    return Err(ImportError::Malformed {
                        path: path.to_path_buf(),
                        line,
                        kind: "v",
                        detail: "expected 3 coordinates".to_string(),
                    });
                }
                positions.push(Vec3::new(coords[0], coords[1], coords[2]));
            }
            "f" => {
                let indices: Vec<usize> = tokens
                    .map(|tok| parse_face_index(path, line, tok, positions.len()))
                    .collect::<Result<_, _>>()?;
                if indices.len() < 3 {
                    return Err(ImportError::Malformed {
                        path: path.to_path_buf(),
                        line,
                        kind: "f",
                        detail: "face must reference at least 3 vertices".to_string(),
                    });
                }
                for i in 1..indices.len() - 1 {
                    triangles.push(Triangle::new(
                        positions[indices[0]],
                        positions[indices[i]],
                        positions[indices[i + 1]],
                        material,
                    ));
                }
            }
            _ => continue,
        }
    }

    if triangles.is_empty() {
        return Err(ImportError::Empty { path: path.to_path_buf() });
    }

    Ok(Mesh::new(triangles, material))
}

fn parse_float(path: &Path, line: usize, kind: &'static str, tok: &str) -> Result<f32, ImportError> {
    tok.parse::<f32>().map_err(|_| ImportError::Malformed {
        path: path.to_path_buf(),
        line,
        kind,
        detail: format!("`{tok}` is not a valid number"),
    })
}

/// Parses one `f` record's vertex reference (`i`, `i/j`, or `i/j/k`),
/// returning a zero-based index into `positions`. OBJ indices are 1-based
/// and may be negative (relative to the current vertex count).
fn parse_face_index(path: &Path, line: usize, tok: &str, vertex_count: usize) -> Result<usize, ImportError> {
    let index_str = tok.split('/').next().unwrap_or(tok);
    let raw: i64 = index_str.parse().map_err(|_| ImportError::Malformed {
        path: path.to_path_buf(),
        line,
        kind: "f",
        detail: format!("`{tok}` is not a valid vertex reference"),
    })?;
    let resolved = if raw < 0 { vertex_count as i64 + raw } else { raw - 1 };
    if resolved < 0 || resolved as usize >= vertex_count {
        return Err(ImportError::Malformed {
            path: path.to_path_buf(),
            line,
            kind: "f",
            detail: format!("vertex index {raw} out of range (have {vertex_count} vertices)"),
        });
    }
    Ok(resolved as usize)
}
