use std::path::{Path, PathBuf};

#[derive(Debug)]
pub struct SourcePath {
	pub full: PathBuf,
	pub name: String,
}

pub(crate) fn join_parent(parent_path: &Path, x: &String) -> SourcePath {
	let joined = parent_path.join(x); // If x is absolute, it replaces the current path.
	match joined.try_exists() {
		Ok(true) => match joined.canonicalize() {
			Ok(path) => SourcePath { full: path, name: x.clone() },
			Err(e) => {
				log::warn!("Could not canonicalize path \"{}\": {}", joined.to_string_lossy(), e);
				SourcePath { full: joined, name: x.clone() }
			}
		},
		Ok(false) => {
			log::warn!("Path does not exist: \"{}\"", joined.to_string_lossy());
			SourcePath { full: joined, name: x.clone() }
		}
		Err(e) => {
			log::warn!("Existence of path could not be confirmed \"{}\": {}", joined.to_string_lossy(), e);
			SourcePath { full: joined, name: x.clone() }
		}
	}
}

fn has_extension(src_filename: &str, extensions: &[&str]) -> bool {
	match Path::new(src_filename).extension().and_then(|x| x.to_str()) {
		Some(ext) => extensions.iter().any(|x| ext.eq_ignore_ascii_case(x)),
		None => false,
	}
}

pub(crate) fn is_compiled_source(src_filename: &str) -> bool {
	has_extension(src_filename, &["c", "cc", "cpp", "cxx", "c++", "asm"])
}

pub(crate) fn is_header(src_filename: &str) -> bool {
	has_extension(src_filename, &["h", "hh", "hpp", "hxx", "h++", "inl"])
}

/// Source files of a binary, split by how a project lists them.
#[derive(Debug, Default)]
pub struct Sources {
	pub compiled: Vec<SourcePath>,
	pub headers: Vec<SourcePath>,
}

impl Sources {
	pub(crate) fn from_slice(sources: &[String], parent_path: &Path) -> Result<Self, String> {
		sources
			.iter()
			.map(|x| join_parent(parent_path, x))
			.try_fold(Sources::default(), |mut acc, src| {
				if is_compiled_source(&src.name) {
					acc.compiled.push(src);
				} else if is_header(&src.name) {
					acc.headers.push(src);
				} else {
					return Err(format!("Unknown source type: {}", &src.name));
				}
				Ok(acc)
			})
	}
}
