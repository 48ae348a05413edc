//! Router source renderer.
//!
//! Emits the React router module for a [`RouteTable`]. All escaping of
//! user-controlled text (route paths, module specifiers, file names) happens
//! in the helpers at the bottom of this file.

use crate::table::{NotFoundRoute, RouteElement, RouteTable};
use std::fmt::Write;

/// Identifier bound to the project's custom not-found page.
pub const NOT_FOUND_IDENT: &str = "NotFound";

/// Identifier of the built-in 404 component.
pub const BUILTIN_NOT_FOUND_IDENT: &str = "DefaultNotFound";

const PREAMBLE: &str = r#"import React, { Suspense } from 'react';
import { BrowserRouter as Router, Routes, Route } from 'react-router-dom';
import './app/globals.css';

class ErrorBoundary extends React.Component {
  constructor(props) {
    super(props);
    this.state = { hasError: false, error: null };
  }

  static getDerivedStateFromError(error) {
    return { hasError: true, error };
  }

  componentDidCatch(error, errorInfo) {
    console.error('Page Error:', error, errorInfo);
  }

  render() {
    if (this.state.hasError) {
      return (
        <div style={{
          minHeight: '100vh',
          display: 'flex',
          alignItems: 'center',
          justifyContent: 'center',
          flexDirection: 'column',
          fontFamily: 'system-ui, -apple-system, sans-serif',
          padding: '2rem',
          background: '#f8f9fa'
        }}>
          <div style={{
            background: 'white',
            padding: '2rem',
            borderRadius: '1rem',
            boxShadow: '0 4px 6px rgba(0,0,0,0.1)',
            maxWidth: '600px',
            textAlign: 'center'
          }}>
            <h1 style={{ fontSize: '2rem', marginBottom: '1rem', color: '#e74c3c' }}>Page Error</h1>
            <p style={{ fontSize: '1rem', color: '#666', marginBottom: '1rem' }}>
              This page has an error. Please check the component:
            </p>
            <pre style={{
              background: '#f8f9fa',
              padding: '1rem',
              borderRadius: '0.5rem',
              textAlign: 'left',
              overflow: 'auto',
              fontSize: '0.875rem',
              color: '#e74c3c'
            }}>
              {this.state.error?.toString()}
            </pre>
            <a href="/" style={{
              display: 'inline-block',
              marginTop: '1rem',
              padding: '0.75rem 1.5rem',
              background: '#00CFFF',
              color: 'white',
              textDecoration: 'none',
              borderRadius: '0.5rem',
              fontWeight: '600'
            }}>
              &larr; Go Home
            </a>
          </div>
        </div>
      );
    }

    return this.props.children;
  }
}

function SafeRoute({ component: Component, ...rest }) {
  return (
    <ErrorBoundary>
      <Component {...rest} />
    </ErrorBoundary>
  );
}

function EmptyPage({ pagePath }) {
  return (
    <div style={{
      minHeight: '100vh',
      display: 'flex',
      alignItems: 'center',
      justifyContent: 'center',
      flexDirection: 'column',
      fontFamily: 'system-ui, -apple-system, sans-serif',
      padding: '2rem',
      background: '#f8f9fa'
    }}>
      <div style={{
        background: 'white',
        padding: '2rem',
        borderRadius: '1rem',
        boxShadow: '0 4px 6px rgba(0,0,0,0.1)',
        maxWidth: '600px',
        textAlign: 'center'
      }}>
        <h1 style={{ fontSize: '2rem', marginBottom: '1rem', color: '#3498db' }}>Empty Page</h1>
        <p style={{ fontSize: '1rem', color: '#666', marginBottom: '1rem' }}>
          This page exists but has no content yet.
        </p>
        <code style={{
          background: '#f8f9fa',
          padding: '0.5rem 1rem',
          borderRadius: '0.5rem',
          fontSize: '0.875rem',
          color: '#3498db',
          display: 'block',
          marginBottom: '1rem'
        }}>
          {pagePath}
        </code>
        <p style={{ fontSize: '0.875rem', color: '#999', marginBottom: '1.5rem' }}>
          Add a default export to this file and it will reload automatically.
        </p>
        <a href="/" style={{
          display: 'inline-block',
          padding: '0.75rem 1.5rem',
          background: '#00CFFF',
          color: 'white',
          textDecoration: 'none',
          borderRadius: '0.5rem',
          fontWeight: '600'
        }}>
          &larr; Go Home
        </a>
      </div>
    </div>
  );
}

"#;

const APP_OPEN: &str = r#"
export default function App() {
  return (
    <Router>
      <Suspense fallback={
        <div style={{
          minHeight: '100vh',
          display: 'flex',
          alignItems: 'center',
          justifyContent: 'center',
          fontFamily: 'system-ui, -apple-system, sans-serif',
          background: '#f8f9fa',
          color: '#666'
        }}>
          <div style={{ textAlign: 'center' }}>
            <div style={{
              width: '40px',
              height: '40px',
              border: '3px solid #f3f3f3',
              borderTop: '3px solid #00CFFF',
              borderRadius: '50%',
              animation: 'bini-spin 1s linear infinite',
              margin: '0 auto 1rem'
            }}></div>
            <p>Loading page...</p>
            <style>{`
              @keyframes bini-spin {
                0% { transform: rotate(0deg); }
                100% { transform: rotate(360deg); }
              }
            `}</style>
          </div>
        </div>
      }>
        <Routes>
"#;

const APP_CLOSE: &str = r#"        </Routes>
      </Suspense>
    </Router>
  );
}
"#;

const BUILTIN_NOT_FOUND: &str = r#"
function DefaultNotFound() {
  return (
    <div style={{
      minHeight: '100vh',
      display: 'flex',
      alignItems: 'center',
      justifyContent: 'center',
      flexDirection: 'column',
      fontFamily: 'system-ui, -apple-system, sans-serif',
      background: 'linear-gradient(135deg, #00CFFF 0%, #0077FF 100%)',
      color: 'white'
    }}>
      <h1 style={{ fontSize: '4rem', marginBottom: '1rem', fontWeight: 'bold' }}>404</h1>
      <p style={{ fontSize: '1.5rem', marginBottom: '0.5rem' }}>Page not found</p>
      <p style={{ fontSize: '1rem', opacity: 0.8, marginBottom: '2rem' }}>
        The page you're looking for doesn't exist
      </p>
      <a href="/" style={{
        padding: '1rem 2rem',
        background: 'white',
        color: '#00CFFF',
        textDecoration: 'none',
        borderRadius: '0.5rem',
        fontWeight: '600',
        fontSize: '1.1rem',
        boxShadow: '0 4px 6px rgba(0,0,0,0.1)'
      }}>
        &larr; Back to Home
      </a>
    </div>
  );
}
"#;

/// Render the router module for `table`.
///
/// Output is a pure function of the table, so an unchanged tree renders
/// byte-identical source.
pub fn render(table: &RouteTable) -> String {
    let mut out = String::with_capacity(PREAMBLE.len() + APP_OPEN.len() + 256 * table.len());
    out.push_str(PREAMBLE);

    if let NotFoundRoute::Custom { ref module_path } = table.not_found {
        write_lazy_import(&mut out, NOT_FOUND_IDENT, module_path);
    }
    for import in &table.imports {
        write_lazy_import(&mut out, &import.ident, &import.module_path);
    }

    out.push_str(APP_OPEN);

    for route in &table.routes {
        let _ = write!(&mut out, "          <Route path=\"{}\" element={{", jsx_attr(&route.path));
        let _ = match route.element {
            RouteElement::Component(ref ident) => {
                write!(&mut out, "<SafeRoute component={{{}}} />", ident)
            }
            RouteElement::Placeholder { ref page_path } => {
                write!(&mut out, "<EmptyPage pagePath=\"{}\" />", jsx_attr(page_path))
            }
        };
        out.push_str("} />");
        if route.dynamic {
            let _ = write!(&mut out, " {{/* Dynamic: {} */}}", jsx_comment(&route.path));
        }
        out.push('\n');
    }

    let fallback = match table.not_found {
        NotFoundRoute::Custom { .. } => NOT_FOUND_IDENT,
        NotFoundRoute::Builtin => BUILTIN_NOT_FOUND_IDENT,
    };
    let _ = writeln!(&mut out, "          <Route path=\"*\" element={{<{} />}} />", fallback);

    out.push_str(APP_CLOSE);

    if table.not_found == NotFoundRoute::Builtin {
        out.push_str(BUILTIN_NOT_FOUND);
    }

    out
}

fn write_lazy_import(out: &mut String, ident: &str, module_path: &str) {
    let _ = writeln!(
        out,
        "const {} = React.lazy(() => import('{}'));",
        ident,
        js_string(module_path)
    );
}

/// Escape text for a single-quoted JavaScript string literal.
pub fn js_string(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\'' => out.push_str("\\'"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\u{2028}' => out.push_str("\\u2028"),
            '\u{2029}' => out.push_str("\\u2029"),
            _ => out.push(c),
        }
    }
    out
}

/// Escape text for a double-quoted JSX attribute.
///
/// JSX attribute strings take no backslash escapes, only HTML entities.
pub fn jsx_attr(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
    out
}

/// Keep text from terminating a `{/* ... */}` comment early.
pub fn jsx_comment(s: &str) -> String {
    s.replace("*/", "*\\/")
}
