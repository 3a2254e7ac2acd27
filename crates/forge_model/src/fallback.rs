//! Deterministic offline generation.
//!
//! Used whenever no model endpoint is reachable or the configured one
//! fails. Output is complete component source, never an error.

use forge_pages::PageKind;
use regex::Regex;
use tracing::debug;

use crate::client::GenerationContext;

/// Renders complete default components without any model involvement.
#[derive(Debug, Clone, Copy, Default)]
pub struct FallbackGenerator;

impl FallbackGenerator {
    pub fn new() -> Self {
        Self
    }

    /// Produce component source for the request. Existing source is lightly
    /// modified by prompt keyword; otherwise a per-kind default component is
    /// rendered with a title derived from the prompt.
    pub fn generate_page(&self, context: &GenerationContext) -> String {
        if let Some(current) = context.current_source.as_deref() {
            debug!(
                "Fallback modifying existing source for page {}",
                context.page_id
            );
            return modify_existing_source(current, &context.prompt);
        }

        debug!(
            "Fallback rendering a default {} component for page {}",
            context.page_kind, context.page_id
        );
        let title = derived_title(&context.prompt);
        match context.page_kind {
            PageKind::H5 => render_h5(&title, &context.prompt),
            PageKind::Admin => render_admin(&title, &context.prompt),
            PageKind::Pc => render_pc(&title, &context.prompt),
        }
    }
}

/// Canned title from prompt keywords, with a per-kind default.
pub fn fallback_title(prompt: &str, kind: PageKind) -> String {
    let keywords = prompt.to_lowercase();

    if keywords.contains("login") || keywords.contains("sign in") {
        let title = if kind == PageKind::Admin {
            "Admin Login"
        } else {
            "User Login"
        };
        return title.to_string();
    }
    if keywords.contains("register") || keywords.contains("sign up") {
        return "User Registration".to_string();
    }
    if keywords.contains("home") || keywords.contains("landing") {
        return "Home".to_string();
    }
    if keywords.contains("product") || keywords.contains("catalog") {
        return "Product Showcase".to_string();
    }
    if keywords.contains("news") || keywords.contains("article") {
        return "News".to_string();
    }
    if keywords.contains("about") {
        return "About Us".to_string();
    }
    if keywords.contains("contact") {
        return "Contact Us".to_string();
    }
    if keywords.contains("dashboard") {
        return "Data Dashboard".to_string();
    }
    if keywords.contains("user management") || keywords.contains("user list") {
        return "User Management".to_string();
    }
    if keywords.contains("order") {
        return "Order Management".to_string();
    }

    kind.default_title().to_string()
}

/// Title text lifted from the head of the prompt.
fn derived_title(prompt: &str) -> String {
    let trimmed = prompt.trim();
    if trimmed.chars().count() <= 20 {
        trimmed.to_string()
    } else {
        let head: String = trimmed.chars().take(20).collect();
        format!("{head}...")
    }
}

/// Keyword-driven tweaks to existing source: a color swap when the prompt
/// mentions colors, a heading swap when it mentions titles.
fn modify_existing_source(source: &str, prompt: &str) -> String {
    let mut modified = source.to_string();
    let keywords = prompt.to_lowercase();

    if keywords.contains("color") || keywords.contains("colour") {
        modified = modified.replace("#1890ff", "#ff4d4f");
        modified = modified.replace("bg-blue-500", "bg-red-500");
    }

    if keywords.contains("title") || keywords.contains("heading") {
        let title = derived_title(prompt);
        if let Ok(re) = Regex::new(r"<h1([^>]*)>.*?</h1>") {
            modified = re
                .replace_all(&modified, |caps: &regex::Captures| {
                    format!("<h1{}>{}</h1>", &caps[1], title)
                })
                .into_owned();
        }
    }

    modified
}

fn render_h5(title: &str, prompt: &str) -> String {
    format!(
        r#"import React from 'react';

const App: React.FC = () => (
  <div className="max-w-md mx-auto bg-white min-h-screen shadow-lg">
    <header className="bg-blue-500 text-white p-4 text-center">
      <h1 className="text-xl font-bold">{title}</h1>
    </header>
    <main className="p-4">
      <section className="bg-white rounded-lg p-4 mb-4 shadow-sm border">
        <h2 className="text-lg font-semibold text-gray-800 mb-2">{prompt}</h2>
        <p className="text-gray-600 mb-4">
          This mobile page was rendered from the built-in offline template.
        </p>
        <button className="w-full bg-blue-500 text-white py-3 px-4 rounded-lg font-medium hover:bg-blue-600 transition-colors">
          Get started
        </button>
      </section>
      <section className="grid grid-cols-2 gap-3">
        <div className="bg-gray-50 p-3 rounded-lg text-center">
          <div className="text-2xl font-bold text-blue-500">100+</div>
          <div className="text-sm text-gray-600">Users</div>
        </div>
        <div className="bg-gray-50 p-3 rounded-lg text-center">
          <div className="text-2xl font-bold text-green-500">50+</div>
          <div className="text-sm text-gray-600">Products</div>
        </div>
      </section>
    </main>
  </div>
);

export default App;
"#
    )
}

fn render_admin(title: &str, prompt: &str) -> String {
    format!(
        r##"import React from 'react';

const App: React.FC = () => (
  <div className="flex h-screen bg-gray-100">
    <aside className="w-64 bg-gray-800 text-white shadow-lg">
      <div className="p-6 bg-gray-900 border-b border-gray-700">
        <h2 className="text-xl font-bold">Admin Console</h2>
      </div>
      <nav className="p-4 space-y-2">
        <a href="#" className="block px-4 py-2 rounded-lg bg-blue-600 text-white font-medium">Dashboard</a>
        <a href="#" className="block px-4 py-2 rounded-lg text-gray-300 hover:bg-gray-700 hover:text-white transition-colors">Users</a>
        <a href="#" className="block px-4 py-2 rounded-lg text-gray-300 hover:bg-gray-700 hover:text-white transition-colors">Content</a>
        <a href="#" className="block px-4 py-2 rounded-lg text-gray-300 hover:bg-gray-700 hover:text-white transition-colors">Settings</a>
      </nav>
    </aside>
    <div className="flex-1 flex flex-col">
      <header className="bg-white shadow-sm border-b border-gray-200 p-6">
        <h1 className="text-2xl font-bold text-gray-800">{title}</h1>
        <p className="text-gray-600 mt-1">{prompt}</p>
      </header>
      <main className="flex-1 p-6">
        <div className="grid grid-cols-1 md:grid-cols-2 lg:grid-cols-4 gap-6 mb-8">
          <div className="bg-white p-6 rounded-lg shadow-sm border">
            <p className="text-sm font-medium text-gray-600">Total users</p>
            <p className="text-2xl font-bold text-gray-900">1,234</p>
            <p className="text-xs text-green-600 mt-2">+12% from last month</p>
          </div>
          <div className="bg-white p-6 rounded-lg shadow-sm border">
            <p className="text-sm font-medium text-gray-600">Visits today</p>
            <p className="text-2xl font-bold text-gray-900">567</p>
            <p className="text-xs text-green-600 mt-2">+8% from yesterday</p>
          </div>
        </div>
        <div className="bg-white rounded-lg shadow-sm border">
          <div className="p-6 border-b border-gray-200">
            <h3 className="text-lg font-semibold text-gray-800">Recent activity</h3>
          </div>
          <div className="p-6">
            <p className="text-gray-600">Management data and charts live here.</p>
          </div>
        </div>
      </main>
    </div>
  </div>
);

export default App;
"##
    )
}

fn render_pc(title: &str, prompt: &str) -> String {
    format!(
        r#"import React from 'react';

const App: React.FC = () => (
  <div className="bg-white">
    <header className="bg-gradient-to-r from-blue-600 to-purple-600 text-white py-20">
      <div className="container mx-auto px-6 text-center">
        <h1 className="text-5xl font-bold mb-4">{title}</h1>
        <p className="text-xl opacity-90 max-w-2xl mx-auto">{prompt}</p>
        <button className="mt-8 bg-white text-blue-600 px-8 py-3 rounded-full font-semibold hover:bg-gray-100 transition-colors duration-300 shadow-lg">
          Learn more
        </button>
      </div>
    </header>
    <main className="py-20">
      <div className="container mx-auto px-6">
        <h2 className="text-4xl font-bold text-center text-gray-800 mb-12">Highlights</h2>
        <div className="grid grid-cols-1 md:grid-cols-3 gap-8">
          <div className="bg-white p-8 rounded-xl shadow-lg hover:shadow-xl transition-shadow duration-300">
            <h3 className="text-xl font-semibold text-center text-gray-800 mb-3">Professional design</h3>
            <p className="text-gray-600 text-center">A page layout generated from your requirements with modern Tailwind CSS styling.</p>
          </div>
          <div className="bg-white p-8 rounded-xl shadow-lg hover:shadow-xl transition-shadow duration-300">
            <h3 className="text-xl font-semibold text-center text-gray-800 mb-3">Responsive layout</h3>
            <p className="text-gray-600 text-center">Adapts to every screen size for a consistent experience across devices.</p>
          </div>
          <div className="bg-white p-8 rounded-xl shadow-lg hover:shadow-xl transition-shadow duration-300">
            <h3 className="text-xl font-semibold text-center text-gray-800 mb-3">Modern style</h3>
            <p className="text-gray-600 text-center">Contemporary visual language built from utility classes.</p>
          </div>
        </div>
      </div>
    </main>
    <footer className="bg-gray-800 text-white py-12">
      <div className="container mx-auto px-6 text-center">
        <p>Generated page preview.</p>
      </div>
    </footer>
  </div>
);

export default App;
"#
    )
}
