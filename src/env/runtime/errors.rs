#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    pub file: String,
    pub line_number: usize,
}

impl Location {
    pub fn new(file: String, line_number: usize) -> Self {
        Self { file, line_number }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Error {
    pub error_type: String,
    pub msg: String,
    pub help: Option<String>,
    pub loc: Option<Location>,
}

impl Error {
    pub fn new(error_type: &str, msg: &str, file_path: &str) -> Self {
        Self {
            error_type: error_type.to_string(),
            msg: msg.to_string(),
            help: None,
            loc: Some(Location::new(file_path.to_string(), 0)),
        }
    }

    pub fn at_line(error_type: &str, msg: &str, file_path: &str, line: usize) -> Self {
        Self {
            error_type: error_type.to_string(),
            msg: msg.to_string(),
            help: None,
            loc: Some(Location::new(file_path.to_string(), line)),
        }
    }

    pub fn with_help(error_type: &str, msg: &str, help: &str, file_path: &str, line: usize) -> Self {
        Self {
            error_type: error_type.to_string(),
            msg: msg.to_string(),
            help: Some(help.to_string()),
            loc: Some(Location::new(file_path.to_string(), line)),
        }
    }

    pub fn error_type(&self) -> &str {
        &self.error_type
    }

    pub fn msg(&self) -> &str {
        &self.msg
    }

    pub fn help(&self) -> Option<&str> {
        self.help.as_deref()
    }

    pub fn location(&self) -> Option<&Location> {
        self.loc.as_ref()
    }

    pub fn line(&self) -> usize {
        self.loc.as_ref().map(|loc| loc.line_number).unwrap_or(0)
    }

    pub fn location_string(&self) -> String {
        if let Some(loc) = &self.loc {
            if loc.line_number > 0 {
                format!("{}:{}", loc.file, loc.line_number)
            } else {
                loc.file.clone()
            }
        } else {
            "<unknown location>".to_string()
        }
    }
}
