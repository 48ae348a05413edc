//! Project templates for `bini create`.

use crate::config::BiniConfig;
use serde_json::{json, Map, Value};

/// Source language of the generated project.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Language {
    JavaScript,
    TypeScript,
}

impl Language {
    /// Extension for component files (`jsx` / `tsx`).
    pub fn component_ext(self) -> &'static str {
        match self {
            Language::JavaScript => "jsx",
            Language::TypeScript => "tsx",
        }
    }

    /// Extension for plain modules (`js` / `ts`).
    pub fn module_ext(self) -> &'static str {
        match self {
            Language::JavaScript => "js",
            Language::TypeScript => "ts",
        }
    }
}

/// How the generated pages are styled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Styling {
    Plain,
    Tailwind,
    CssModules,
}

impl Styling {
    pub fn name(self) -> &'static str {
        match self {
            Styling::Plain => "plain CSS",
            Styling::Tailwind => "Tailwind CSS",
            Styling::CssModules => "CSS Modules",
        }
    }
}

/// Everything the templates depend on.
#[derive(Debug, Clone)]
pub struct ProjectOptions {
    pub name: String,
    pub language: Language,
    pub styling: Styling,
    pub minimal: bool,
}

/// One file to write, relative to the project directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateFile {
    pub path: String,
    pub contents: String,
}

impl TemplateFile {
    fn new(path: impl Into<String>, contents: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            contents: contents.into(),
        }
    }
}

/// All files for a new project, in write order.
///
/// The router file is not included; it is generated from `src/app` once
/// these files exist.
pub fn project_files(opts: &ProjectOptions) -> Vec<TemplateFile> {
    let cx = opts.language.component_ext();
    let mx = opts.language.module_ext();

    let mut files = vec![
        TemplateFile::new("package.json", package_json(opts)),
        TemplateFile::new("index.html", index_html(opts.language)),
        TemplateFile::new("vite.config.mjs", VITE_CONFIG),
        TemplateFile::new("bini.config.json", bini_config_json()),
        TemplateFile::new(".gitignore", GITIGNORE),
    ];

    if !opts.minimal {
        files.push(TemplateFile::new("README.md", readme(opts)));
    }
    if opts.language == Language::TypeScript {
        files.push(TemplateFile::new("tsconfig.json", TSCONFIG));
    }
    if opts.styling == Styling::Tailwind {
        files.push(TemplateFile::new("tailwind.config.js", TAILWIND_CONFIG));
        files.push(TemplateFile::new("postcss.config.mjs", POSTCSS_CONFIG));
    }

    files.push(TemplateFile::new(format!("src/main.{}", cx), main_entry(opts.language)));
    files.push(TemplateFile::new(format!("src/app/layout.{}", cx), layout(opts.language)));
    files.push(TemplateFile::new(format!("src/app/page.{}", cx), home_page(opts.styling)));
    files.push(TemplateFile::new("src/app/globals.css", globals_css(opts.styling)));

    if opts.styling == Styling::CssModules {
        files.push(TemplateFile::new("src/app/page.module.css", PAGE_MODULE_CSS));
    }
    if !opts.minimal {
        files.push(TemplateFile::new(
            format!("src/app/api/hello.{}", mx),
            api_hello(opts.language),
        ));
    }

    files
}

fn deps(pairs: &[(&str, &str)]) -> Map<String, Value> {
    pairs
        .iter()
        .map(|(name, version)| (name.to_string(), Value::from(*version)))
        .collect()
}

/// `package.json` with versions pinned to the supported React/Vite line.
pub fn package_json(opts: &ProjectOptions) -> String {
    let typescript = opts.language == Language::TypeScript;

    let mut dev = deps(&[("@vitejs/plugin-react", "^4.3.4"), ("vite", "^6.0.5")]);
    if typescript {
        dev.extend(deps(&[
            ("@types/react", "^18.3.18"),
            ("@types/react-dom", "^18.3.5"),
            ("@types/node", "^20.17.9"),
            ("typescript", "^5.7.2"),
        ]));
    }
    if opts.styling == Styling::Tailwind {
        dev.extend(deps(&[
            ("tailwindcss", "^3.4.17"),
            ("postcss", "^8.4.49"),
            ("autoprefixer", "^10.4.20"),
        ]));
    }

    let mut scripts = deps(&[
        ("dev", "bini dev"),
        ("build", "bini routes && vite build"),
        ("preview", "vite preview --host"),
        ("routes", "bini routes"),
    ]);
    if typescript {
        scripts.insert("type-check".to_string(), Value::from("tsc --noEmit"));
    }

    let package = json!({
        "name": opts.name,
        "private": true,
        "version": "0.1.0",
        "type": "module",
        "scripts": scripts,
        "dependencies": deps(&[
            ("react", "^18.3.1"),
            ("react-dom", "^18.3.1"),
            ("react-router-dom", "^7.1.1"),
        ]),
        "devDependencies": dev,
    });

    let mut out = serde_json::to_string_pretty(&package).unwrap_or_default();
    out.push('\n');
    out
}

/// `index.html` with the markers the metadata injector fills.
///
/// The viewport, title and description come from the layout's `metadata`.
pub fn index_html(language: Language) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
  <head>
    <meta charset="UTF-8" />
    <!-- BINI_META_TAGS -->
    <!-- /BINI_META_TAGS -->
  </head>
  <body>
    <div id="root"></div>
    <script type="module" src="/src/main.{}"></script>
  </body>
</html>
"#,
        language.component_ext()
    )
}

/// Default `bini.config.json`.
pub fn bini_config_json() -> String {
    let mut out = serde_json::to_string_pretty(&BiniConfig::default()).unwrap_or_default();
    out.push('\n');
    out
}

const VITE_CONFIG: &str = r#"import { readFileSync } from 'node:fs';
import { defineConfig } from 'vite';
import react from '@vitejs/plugin-react';

// `bini dev` passes its port in BINI_PORT; plain `vite` falls back to bini.config.json
function biniPort() {
  if (process.env.BINI_PORT) return Number(process.env.BINI_PORT);
  try {
    const config = JSON.parse(readFileSync(new URL('./bini.config.json', import.meta.url), 'utf8'));
    return config.port ?? 3000;
  } catch {
    return 3000;
  }
}

const biniServer = `http://127.0.0.1:${biniPort()}`;

export default defineConfig({
  plugins: [react()],
  define: {
    __BINI_SERVER__: JSON.stringify(biniServer),
  },
  server: {
    port: 5173,
    open: true,
    proxy: {
      '/api': biniServer,
    },
    // src/App.* is rewritten by `bini dev`, which reloads the page itself
    watch: { ignored: ['**/node_modules/**'] },
  },
});
"#;

const GITIGNORE: &str = r#"node_modules
dist
.DS_Store
*.log
.env
.env.local
"#;

const TSCONFIG: &str = r#"{
  "compilerOptions": {
    "target": "ES2020",
    "lib": ["ES2020", "DOM", "DOM.Iterable"],
    "module": "ESNext",
    "skipLibCheck": true,
    "moduleResolution": "bundler",
    "allowImportingTsExtensions": true,
    "resolveJsonModule": true,
    "isolatedModules": true,
    "noEmit": true,
    "jsx": "react-jsx",
    "strict": true,
    "baseUrl": ".",
    "paths": {
      "@/*": ["./src/*"]
    }
  },
  "include": ["src"],
  "exclude": ["node_modules", "dist"]
}
"#;

const TAILWIND_CONFIG: &str = r#"/** @type {import('tailwindcss').Config} */
export default {
  content: ['./index.html', './src/**/*.{js,jsx,ts,tsx}'],
  darkMode: 'class',
  theme: {
    extend: {},
  },
  plugins: [],
};
"#;

const POSTCSS_CONFIG: &str = r#"export default {
  plugins: {
    tailwindcss: {},
    autoprefixer: {},
  },
};
"#;

fn main_entry(language: Language) -> String {
    let root = match language {
        Language::TypeScript => "document.getElementById('root')!",
        Language::JavaScript => "document.getElementById('root')",
    };
    let declare = match language {
        Language::TypeScript => "\ndeclare const __BINI_SERVER__: string;\n",
        Language::JavaScript => "",
    };
    let ext = language.component_ext();
    format!(
        r#"import React from 'react';
import ReactDOM from 'react-dom/client';
import App from './App.{ext}';
import RootLayout from './app/layout.{ext}';
{declare}
if (import.meta.env.DEV) {{
  const reload = document.createElement('script');
  reload.src = __BINI_SERVER__ + '/__bini_reload__.js';
  document.head.appendChild(reload);
}}

ReactDOM.createRoot({root}).render(
  <React.StrictMode>
    <RootLayout>
      <App />
    </RootLayout>
  </React.StrictMode>
);
"#
    )
}

fn layout(language: Language) -> &'static str {
    match language {
        Language::TypeScript => {
            r#"import React from 'react';
import './globals.css';

interface RootLayoutProps {
  children: React.ReactNode;
}

export const metadata = {
  title: 'Bini.js App',
  description: 'Modern React application built with Bini.js',
};

export default function RootLayout({ children }: RootLayoutProps) {
  return <main className="main-content">{children}</main>;
}
"#
        }
        Language::JavaScript => {
            r#"import './globals.css';

export const metadata = {
  title: 'Bini.js App',
  description: 'Modern React application built with Bini.js',
};

export default function RootLayout({ children }) {
  return <main className="main-content">{children}</main>;
}
"#
        }
    }
}

fn home_page(styling: Styling) -> &'static str {
    match styling {
        Styling::Tailwind => {
            r#"export default function Home() {
  return (
    <div className="min-h-screen flex items-center justify-center bg-gradient-to-br from-blue-50 to-blue-100">
      <div className="text-center">
        <h1 className="text-5xl font-bold text-blue-900">Bini.js</h1>
        <p className="mt-4 text-lg text-blue-700">
          Edit <code>src/app/page</code> and save to reload.
        </p>
      </div>
    </div>
  );
}
"#
        }
        Styling::CssModules => {
            r#"import styles from './page.module.css';

export default function Home() {
  return (
    <div className={styles.container}>
      <h1 className={styles.title}>Bini.js</h1>
      <p className={styles.subtitle}>
        Edit <code>src/app/page</code> and save to reload.
      </p>
    </div>
  );
}
"#
        }
        Styling::Plain => {
            r#"export default function Home() {
  return (
    <div className="container">
      <h1 className="title">Bini.js</h1>
      <p className="subtitle">
        Edit <code>src/app/page</code> and save to reload.
      </p>
    </div>
  );
}
"#
        }
    }
}

fn globals_css(styling: Styling) -> String {
    let base = r#"*,
*::before,
*::after {
  box-sizing: border-box;
}

body {
  margin: 0;
  font-family: system-ui, -apple-system, 'Segoe UI', Roboto, sans-serif;
  -webkit-font-smoothing: antialiased;
}
"#;

    match styling {
        Styling::Tailwind => format!("@tailwind base;\n@tailwind components;\n@tailwind utilities;\n\n{}", base),
        Styling::CssModules => base.to_string(),
        Styling::Plain => format!(
            r#"{}
.container {{
  min-height: 100vh;
  display: flex;
  flex-direction: column;
  align-items: center;
  justify-content: center;
  background: linear-gradient(135deg, #eff6ff, #dbeafe);
}}

.title {{
  font-size: 3rem;
  color: #1e3a8a;
  margin: 0;
}}

.subtitle {{
  color: #1d4ed8;
}}
"#,
            base
        ),
    }
}

const PAGE_MODULE_CSS: &str = r#".container {
  min-height: 100vh;
  display: flex;
  flex-direction: column;
  align-items: center;
  justify-content: center;
  background: linear-gradient(135deg, #eff6ff, #dbeafe);
}

.title {
  font-size: 3rem;
  color: #1e3a8a;
  margin: 0;
}

.subtitle {
  color: #1d4ed8;
}
"#;

fn api_hello(language: Language) -> &'static str {
    match language {
        Language::TypeScript => {
            r#"export default function handler(req: { method: string }) {
  return {
    message: 'Hello from Bini.js TypeScript!',
    timestamp: new Date().toISOString(),
    method: req.method,
  };
}
"#
        }
        Language::JavaScript => {
            r#"export default function handler(req) {
  return {
    message: 'Hello from Bini.js API!',
    timestamp: new Date().toISOString(),
    method: req.method,
  };
}
"#
        }
    }
}

fn readme(opts: &ProjectOptions) -> String {
    let ext = opts.language.component_ext();
    format!(
        r#"# {name}

A Bini.js app using {styling}.

## Getting started

```bash
npm install
npm run dev
```

`npm run dev` runs `bini dev`, which starts Vite, keeps `src/App.{ext}` in
sync with your pages, serves `/api` routes and reloads the browser. Page
metadata exported from `src/app/layout.{ext}` is written into `index.html`.
The reload server port is `port` in `bini.config.json`.

## Routing

Every directory under `src/app` with a `page.{ext}` file becomes a route:

| File | Route |
|------|-------|
| `src/app/page.{ext}` | `/` |
| `src/app/about/page.{ext}` | `/about` |
| `src/app/blog/[slug]/page.{ext}` | `/blog/:slug` |

Add `src/app/not-found.{ext}` to replace the built-in 404 page.

## API routes

`src/app/api/hello.js` answers `/api/hello`. A handler's default export
receives `(req, res)` and either returns a value, sent as JSON, or calls
`res.status(...)`, `res.json(...)` or `res.send(...)`.
"#,
        name = opts.name,
        styling = opts.styling.name(),
        ext = ext,
    )
}
