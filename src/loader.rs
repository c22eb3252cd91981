//! Loader for JaCoCo XML coverage reports.
//!
//! JaCoCo XML structure (the subset this crate consumes):
//!   <report name="...">
//!     <sessioninfo id="..." start="..." dump="..."/>
//!     <package name="com/example">
//!       <sourcefile name="Foo.java">
//!         <line nr="10" mi="0" ci="3" mb="0" cb="2"/>
//!         <line nr="11" mi="0" ci="5" mb="1" cb="1"/>
//!         <counter type="LINE" missed="1" covered="5"/>
//!       </sourcefile>
//!     </package>
//!   </report>
//!
//! Class, method, and counter elements are not consumed. Attribute values on
//! the consumed elements are kept as raw strings: absence vs. malformed
//! presence matters to the classifier (absent counters default to 0,
//! malformed ones skip the line), so numeric interpretation is deferred.

use std::path::Path;

use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;

use crate::error::{JacorsError, Result};

/// A single `<line>` element, attributes unparsed.
#[derive(Debug, Clone, Default)]
pub struct LineElem {
    pub nr: Option<String>,
    pub ci: Option<String>,
    pub mi: Option<String>,
    pub mb: Option<String>,
    pub cb: Option<String>,
}

/// A `<sourcefile>` element and its `<line>` children, in document order.
#[derive(Debug, Clone, Default)]
pub struct SourceFileElem {
    pub name: Option<String>,
    pub lines: Vec<LineElem>,
}

/// A `<package>` element and its `<sourcefile>` children, in document order.
#[derive(Debug, Clone, Default)]
pub struct PackageElem {
    pub name: Option<String>,
    pub source_files: Vec<SourceFileElem>,
}

/// The parsed report tree, packages in document order.
#[derive(Debug, Clone, Default)]
pub struct ReportDoc {
    pub packages: Vec<PackageElem>,
}

/// Read and parse the report at `path`. The path must name a regular file.
pub fn load(path: &Path) -> Result<ReportDoc> {
    if !path.is_file() {
        return Err(JacorsError::ReportNotFound(path.display().to_string()));
    }
    let content = std::fs::read(path)?;
    parse(&content)
}

/// Parse JaCoCo XML report data from raw bytes.
pub fn parse(input: &[u8]) -> Result<ReportDoc> {
    let mut reader = Reader::from_reader(input);
    let mut buf = Vec::new();

    let mut doc = ReportDoc::default();
    let mut current_package: Option<PackageElem> = None;
    let mut current_sourcefile: Option<SourceFileElem> = None;

    loop {
        let event = reader.read_event_into(&mut buf);
        let is_start_event = matches!(&event, Ok(Event::Start(_)));
        match event {
            Err(e) => {
                return Err(JacorsError::Xml {
                    source: e,
                    position: reader.buffer_position(),
                })
            }
            Ok(Event::Eof) => break,
            Ok(Event::Start(ref e)) | Ok(Event::Empty(ref e)) => match e.name().as_ref() {
                b"package" => {
                    let package = PackageElem {
                        name: get_attr(e, b"name"),
                        source_files: Vec::new(),
                    };
                    if is_start_event {
                        current_package = Some(package);
                    } else {
                        doc.packages.push(package);
                    }
                }
                b"sourcefile" => {
                    // Source files outside a package are not part of the
                    // schema and are ignored.
                    if let Some(package) = current_package.as_mut() {
                        let sourcefile = SourceFileElem {
                            name: get_attr(e, b"name"),
                            lines: Vec::new(),
                        };
                        if is_start_event {
                            current_sourcefile = Some(sourcefile);
                        } else {
                            package.source_files.push(sourcefile);
                        }
                    }
                }
                b"line" => {
                    if let Some(file) = current_sourcefile.as_mut() {
                        file.lines.push(LineElem {
                            nr: get_attr(e, b"nr"),
                            ci: get_attr(e, b"ci"),
                            mi: get_attr(e, b"mi"),
                            mb: get_attr(e, b"mb"),
                            cb: get_attr(e, b"cb"),
                        });
                    }
                }
                _ => {}
            },
            Ok(Event::End(ref e)) => match e.name().as_ref() {
                b"sourcefile" => {
                    if let (Some(package), Some(file)) =
                        (current_package.as_mut(), current_sourcefile.take())
                    {
                        package.source_files.push(file);
                    }
                }
                b"package" => {
                    if let Some(package) = current_package.take() {
                        doc.packages.push(package);
                    }
                }
                _ => {}
            },
            _ => {}
        }
        buf.clear();
    }

    // Handle elements left unclosed at EOF
    if let (Some(package), Some(file)) = (current_package.as_mut(), current_sourcefile.take()) {
        package.source_files.push(file);
    }
    if let Some(package) = current_package.take() {
        doc.packages.push(package);
    }

    Ok(doc)
}

/// Extract a single attribute value from an element, XML-unescaped.
fn get_attr(e: &BytesStart, name: &[u8]) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|attr| attr.key.as_ref() == name)
        .and_then(|attr| attr.unescape_value().ok())
        .map(|value| value.to_string())
}
