#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileNameTemplate {
  template: String,
}

impl Default for FileNameTemplate {
  fn default() -> Self {
    Self::from("[name].[ext]".to_string())
  }
}

impl From<String> for FileNameTemplate {
  fn from(template: String) -> Self {
    Self { template }
  }
}

impl From<&str> for FileNameTemplate {
  fn from(template: &str) -> Self {
    Self {
      template: template.to_string(),
    }
  }
}

#[derive(Debug, Default)]
pub struct RenderOptions<'me> {
  pub name: Option<&'me str>,
  pub ext: Option<&'me str>,
  pub format: Option<&'me str>,
}

impl FileNameTemplate {
  pub fn render(&self, options: RenderOptions) -> String {
    let mut tmp = self.template.clone();
    if let Some(name) = options.name {
      tmp = tmp.replace("[name]", name);
    }
    if let Some(ext) = options.ext {
      tmp = tmp.replace("[ext]", ext);
    }
    if let Some(format) = options.format {
      tmp = tmp.replace("[format]", format);
    }
    tmp
  }
}
