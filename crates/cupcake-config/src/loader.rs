//! Reads a shop configuration that is split across several TOML files.
//!
//! A file lists the files it pulls in under `include`, either as one path or
//! as an array of paths, resolved against the including file's directory.
//! Included files may include further files. Every file is read at most once
//! and each top-level section may only be defined by one of them.

use crate::{resolve_env_vars, Config, ConfigError};
use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;

const INCLUDE_KEY: &str = "include";

type TableFuture<'a> = Pin<Box<dyn Future<Output = Result<toml::Table, ConfigError>> + Send + 'a>>;

/// Merges an entry file and everything it includes into one [`Config`].
pub struct ConfigLoader {
	/// Directory the entry file is resolved against.
	base_dir: PathBuf,
	/// Canonical paths of the files read so far.
	seen: HashSet<PathBuf>,
	/// File that defined each top-level section.
	owners: HashMap<String, PathBuf>,
}

impl ConfigLoader {
	pub fn new(base_dir: impl AsRef<Path>) -> Self {
		Self {
			base_dir: base_dir.as_ref().to_path_buf(),
			seen: HashSet::new(),
			owners: HashMap::new(),
		}
	}

	/// Reads `entry` with its includes and validates the merged result.
	pub async fn load_config(&mut self, entry: impl AsRef<Path>) -> Result<Config, ConfigError> {
		let base_dir = self.base_dir.clone();
		let entry = locate(&base_dir, entry.as_ref()).await?;
		let merged = self.collect(entry).await?;

		let config: Config = toml::Value::Table(merged).try_into()?;
		config.validate()?;
		Ok(config)
	}

	/// Reads one file and, depth first, the files it includes.
	fn collect(&mut self, file: PathBuf) -> TableFuture<'_> {
		Box::pin(async move {
			let content = self.read_once(&file).await?;
			let mut table: toml::Table = toml::from_str(&content)?;
			let includes = include_paths(table.remove(INCLUDE_KEY))?;
			self.claim_sections(&table, &file)?;

			let dir = file.parent().map(Path::to_path_buf).unwrap_or_default();
			for include in includes {
				let included = locate(&dir, &include).await?;
				table.extend(self.collect(included).await?);
			}
			Ok(table)
		})
	}

	/// Reads a file with its environment variables resolved, refusing any
	/// file that was already read.
	async fn read_once(&mut self, file: &Path) -> Result<String, ConfigError> {
		let canonical = tokio::fs::canonicalize(file).await.map_err(|e| {
			ConfigError::Io(std::io::Error::new(
				e.kind(),
				format!("Cannot resolve path {}: {}", file.display(), e),
			))
		})?;
		if !self.seen.insert(canonical.clone()) {
			return Err(ConfigError::Validation(format!(
				"Include cycle: {} was already loaded",
				canonical.display()
			)));
		}

		let content = tokio::fs::read_to_string(&canonical).await?;
		resolve_env_vars(&content)
	}

	fn claim_sections(&mut self, table: &toml::Table, file: &Path) -> Result<(), ConfigError> {
		for section in table.keys() {
			if let Some(owner) = self.owners.get(section) {
				return Err(ConfigError::Validation(format!(
					"Duplicate section '{}' found in {} and {}",
					section,
					owner.display(),
					file.display()
				)));
			}
			self.owners.insert(section.clone(), file.to_path_buf());
		}
		Ok(())
	}
}

/// Reads the `include` value as a list of paths.
fn include_paths(value: Option<toml::Value>) -> Result<Vec<PathBuf>, ConfigError> {
	match value {
		None => Ok(Vec::new()),
		Some(toml::Value::String(path)) => Ok(vec![PathBuf::from(path)]),
		Some(toml::Value::Array(items)) => items
			.into_iter()
			.map(|item| match item {
				toml::Value::String(path) => Ok(PathBuf::from(path)),
				_ => Err(ConfigError::Validation(
					"Include array must contain only strings".into(),
				)),
			})
			.collect(),
		Some(_) => Err(ConfigError::Validation(
			"Include must be a string or array of strings".into(),
		)),
	}
}

/// Resolves `path` against `dir` and checks that the file exists.
async fn locate(dir: &Path, path: &Path) -> Result<PathBuf, ConfigError> {
	let resolved = if path.is_absolute() {
		path.to_path_buf()
	} else {
		dir.join(path)
	};

	if !tokio::fs::try_exists(&resolved).await? {
		return Err(ConfigError::Io(std::io::Error::new(
			std::io::ErrorKind::NotFound,
			format!("Configuration file not found: {}", resolved.display()),
		)));
	}
	Ok(resolved)
}
