use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use gtmpl::{Context, Template, Value};
use tracing::debug;

use crate::page::{HomePage, NotFoundPage, PostPage, TopicPage, TOPICS_PREFIX};
use crate::routes::POSTS_PREFIX;
use crate::slug::Slug;

/// Responsible for templating pages and writing them to disk. Every page is
/// written as `index.html` inside a directory named after its route so the
/// site works with directory-style URLs.
pub struct Writer<'a> {
    /// The template for post pages.
    pub post_template: &'a Template,

    /// The template for the home page and topic pages.
    pub index_template: &'a Template,

    /// The template for `404.html`.
    pub not_found_template: &'a Template,

    /// The root of the output site.
    pub output_directory: &'a Path,
}

impl Writer<'_> {
    /// Writes `{output_directory}/index.html`.
    pub fn write_home(&self, page: &HomePage) -> Result<PathBuf> {
        let path = self.output_directory.join("index.html");
        self.write_page(&path, self.index_template, page.to_value())?;
        Ok(path)
    }

    /// Writes `{output_directory}/topics/{topic}/index.html`.
    pub fn write_topic(&self, page: &TopicPage) -> Result<PathBuf> {
        let segment = page.topic.path_segment();
        if !is_safe_segment(&segment) {
            return Err(Error::UnsafeRoute(segment));
        }
        let path = self
            .output_directory
            .join(TOPICS_PREFIX)
            .join(segment)
            .join("index.html");
        self.write_page(&path, self.index_template, page.to_value())?;
        Ok(path)
    }

    /// Writes `{output_directory}/blogs/{slug}/index.html`.
    pub fn write_post(&self, page: &PostPage) -> Result<PathBuf> {
        let path = self.post_path(page.props.id)?;
        self.write_page(&path, self.post_template, page.to_value())?;
        Ok(path)
    }

    /// Writes `{output_directory}/404.html`.
    pub fn write_not_found(&self, page: &NotFoundPage) -> Result<PathBuf> {
        let path = self.output_directory.join("404.html");
        self.write_page(&path, self.not_found_template, page.to_value())?;
        Ok(path)
    }

    /// The output file for a post route. Slugs aren't escaped, so one that
    /// would leave the posts directory is refused.
    pub fn post_path(&self, slug: &Slug) -> Result<PathBuf> {
        if !is_safe_segment(slug.as_str()) {
            return Err(Error::UnsafeRoute(slug.to_string()));
        }
        Ok(self
            .output_directory
            .join(POSTS_PREFIX)
            .join(slug.as_str())
            .join("index.html"))
    }

    /// Templates a single page and writes it to `path`, creating parent
    /// directories as needed.
    fn write_page(&self, path: &Path, template: &Template, value: Value) -> Result<()> {
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)?;
        }
        debug!(path = %path.display(), "writing page");
        let mut file = BufWriter::new(File::create(path)?);
        template.execute(&mut file, &Context::from(value)?)?;
        file.flush()?;
        Ok(())
    }
}

/// A route segment may be used as a directory name only if it stays inside
/// its parent directory.
fn is_safe_segment(segment: &str) -> bool {
    !segment.is_empty()
        && segment != "."
        && segment != ".."
        && !segment.contains(['/', '\\'])
}

/// Loads the template files, concatenates their contents, and parses the
/// result into a single template.
pub fn parse_template<P: AsRef<Path>>(
    template_files: impl Iterator<Item = P>,
) -> Result<Template> {
    let mut contents = String::new();
    for template_file in template_files {
        let template_file = template_file.as_ref();
        let text = fs::read_to_string(template_file).map_err(|err| Error::OpenTemplateFile {
            path: template_file.to_owned(),
            err,
        })?;
        contents.push_str(&text);
        contents.push(' ');
    }

    let mut template = Template::default();
    template.parse(&contents).map_err(Error::ParseTemplate)?;
    Ok(template)
}

/// The result of a fallible page-writing operation.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents an error in a page-writing operation.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// An error during templating.
    #[error("template: {0}")]
    Template(String),

    /// Returned for I/O problems while opening template files.
    #[error("opening template file `{}`: {err}", .path.display())]
    OpenTemplateFile { path: PathBuf, err: std::io::Error },

    /// Returned for errors parsing template files.
    #[error("parsing template: {0}")]
    ParseTemplate(String),

    /// Returned for a route whose identifier can't be used as a directory
    /// name.
    #[error("route `{0}` can't be written inside the output directory")]
    UnsafeRoute(String),

    /// An error writing the output files.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<String> for Error {
    /// Converts a template error message into an [`Error`]. This allows us to
    /// use the `?` operator for fallible template operations.
    fn from(err: String) -> Error {
        Error::Template(err)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::page::test::site;
    use crate::page::Chrome;
    use crate::post::Topic;
    use crate::routes::test::post;
    use crate::slug::derive_slug;

    fn template(text: &str) -> Template {
        let mut template = Template::default();
        template.parse(text).unwrap();
        template
    }

    #[test]
    fn test_is_safe_segment() {
        assert!(is_safe_segment("hello-world"));
        assert!(is_safe_segment("c++-&-you"));
        assert!(!is_safe_segment(""));
        assert!(!is_safe_segment(".."));
        assert!(!is_safe_segment("a/b"));
        assert!(!is_safe_segment("a\\b"));
    }

    #[test]
    fn test_post_path() {
        let dir = tempfile::tempdir().unwrap();
        let t = template("");
        let writer = Writer {
            post_template: &t,
            index_template: &t,
            not_found_template: &t,
            output_directory: dir.path(),
        };
        assert_eq!(
            writer.post_path(&derive_slug("Hello World")).unwrap(),
            dir.path().join("blogs/hello-world/index.html")
        );
        assert!(matches!(
            writer.post_path(&derive_slug("Either/Or")),
            Err(Error::UnsafeRoute(_))
        ));
    }

    #[test]
    fn test_write_home() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let site = site();
        let index = template(
            "<title>{{.meta.title}}</title>{{range .posts}}<li>{{.title}}</li>{{end}}",
        );
        let other = template("");
        let writer = Writer {
            post_template: &other,
            index_template: &index,
            not_found_template: &other,
            output_directory: dir.path(),
        };

        let posts = vec![post("Shown", true), post("Hidden", false)];
        let topics: Vec<Topic> = Vec::new();
        let home = HomePage::compose(Chrome::new(&site, &topics, 2024), &posts);
        let path = writer.write_home(&home)?;
        assert_eq!(
            fs::read_to_string(path)?,
            "<title>Test Blog</title><li>Shown</li>"
        );
        Ok(())
    }

    #[test]
    fn test_parse_template_missing_file() {
        match parse_template(std::iter::once("./testdata/theme/missing.html")) {
            Err(Error::OpenTemplateFile { path, .. }) => {
                assert_eq!(path, Path::new("./testdata/theme/missing.html"))
            }
            Err(err) => panic!("unexpected error: {}", err),
            Ok(_) => panic!("parsed a missing template file"),
        }
    }
}
