//! Earthquake preparedness guidance (mitigasi).
//!
//! Static content grouped by phase, rendered into the timeline sections of
//! the page.

use crate::html::html_escape;

/// One guidance card.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GuidanceEntry {
    pub title: &'static str,
    pub description: &'static str,
    pub icon: &'static str,
}

/// Phase of an earthquake the guidance applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Before,
    During,
    After,
}

impl Phase {
    pub const ALL: [Self; 3] = [Self::Before, Self::During, Self::After];

    /// Section heading.
    #[must_use]
    pub const fn heading(self) -> &'static str {
        match self {
            Self::Before => "Sebelum Gempa Terjadi",
            Self::During => "Saat Gempa Terjadi",
            Self::After => "Pasca Gempa",
        }
    }

    /// AOS reveal animation for the whole section.
    #[must_use]
    pub const fn animation(self) -> &'static str {
        match self {
            Self::Before => "fade-right",
            Self::During => "fade-up",
            Self::After => "fade-left",
        }
    }

    #[must_use]
    pub const fn entries(self) -> &'static [GuidanceEntry] {
        match self {
            Self::Before => BEFORE,
            Self::During => DURING,
            Self::After => AFTER,
        }
    }
}

const BEFORE: &[GuidanceEntry] = &[
    GuidanceEntry {
        title: "Persiapkan Kit Darurat",
        description: "Siapkan tas darurat berisi: air mineral, makanan kaleng, obat-obatan, senter, baterai cadangan, dan dokumen penting. Simpan di tempat mudah dijangkau.",
        icon: "🚨",
    },
    GuidanceEntry {
        title: "Identifikasi Titik Kumpul",
        description: "Tentukan lokasi aman di sekitar rumah atau kantor sebagai titik kumpul keluarga atau rekan kerja jika terjadi gempa. Pastikan semua anggota keluarga mengetahui lokasi ini.",
        icon: "📍",
    },
    GuidanceEntry {
        title: "Simulasi Evakuasi",
        description: "Lakukan simulasi evakuasi secara berkala dengan keluarga. Latih anggota keluarga untuk berlindung di bawah meja atau di sudut ruangan yang kuat saat gempa terjadi.",
        icon: "🏃",
    },
    GuidanceEntry {
        title: "Amankan Perabot",
        description: "Pasang penahan atau kunci pada lemari, rak, dan perabot berat agar tidak mudah roboh saat gempa. Hindari menempatkan barang berat di atas tempat tidur atau area tidur.",
        icon: "🛋️",
    },
    GuidanceEntry {
        title: "Perhatikan Instalasi Listrik",
        description: "Pastikan instalasi listrik rumah dalam kondisi baik. Matikan listrik dan gas jika terjadi gempa untuk mencegah kebakaran. Kenali lokasi sekring listrik dan katup gas.",
        icon: "🔌",
    },
];

const DURING: &[GuidanceEntry] = &[
    GuidanceEntry {
        title: "Jaga Ketenangan",
        description: "Tetap tenang dan tidak panik. Ikuti prosedur evakuasi yang telah direncanakan. Bantu yang membutuhkan bantuan jika memungkinkan.",
        icon: "🧘",
    },
    GuidanceEntry {
        title: "Cari Tempat Berlindung",
        description: "Berlindung di bawah meja yang kokoh atau di sudut ruangan. Jauhi jendela dan benda-benda yang mungkin jatuh. Lindungi kepala dengan bantal atau tas.",
        icon: "🏃",
    },
    GuidanceEntry {
        title: "Matikan Listrik dan Gas",
        description: "Segera matikan sumber listrik dan gas untuk mencegah kebakaran atau ledakan. Hindari penggunaan lift dan tangga yang rusak.",
        icon: "⚡",
    },
    GuidanceEntry {
        title: "Ikuti Arahan",
        description: "Dengarkan dan ikuti arahan dari petugas berwenang. Jangan menyebarkan informasi yang belum terverifikasi. Tetap di tempat aman hingga situasi kondusif.",
        icon: "📢",
    },
    GuidanceEntry {
        title: "Siapkan Jalur Evakuasi",
        description: "Kenali dan gunakan jalur evakuasi terdekat. Hindari area yang berpotensi longsor atau runtuh. Menuju titik kumpul yang telah ditentukan.",
        icon: "🚪",
    },
];

const AFTER: &[GuidanceEntry] = &[
    GuidanceEntry {
        title: "Periksa Kondisi Bangunan",
        description: "Lakukan pemeriksaan menyeluruh terhadap struktur bangunan. Waspadai retak, kebocoran gas, atau kerusakan listrik. Jangan masuk ke dalam bangunan sebelum dinyatakan aman.",
        icon: "🏠",
    },
    GuidanceEntry {
        title: "Dokumentasi Kerusakan",
        description: "Foto dan catat semua kerusakan yang terjadi untuk keperluan klaim asuransi. Simpan bukti pembelian dan perbaikan yang dilakukan.",
        icon: "📸",
    },
    GuidanceEntry {
        title: "Koordinasi dengan Tetangga",
        description: "Bantu tetangga yang membutuhkan pertolongan. Bentuk tim untuk pembersihan dan pemulihan lingkungan. Bagikan informasi penting terkait bantuan dan layanan darurat.",
        icon: "🤝",
    },
    GuidanceEntry {
        title: "Pantau Informasi",
        description: "Ikuti perkembangan informasi dari pihak berwenang. Waspadai gempa susulan dan informasi evakuasi. Pastikan menggunakan sumber informasi resmi.",
        icon: "📱",
    },
    GuidanceEntry {
        title: "Perhatikan Kesehatan",
        description: "Jaga kebersihan dan sanitasi untuk mencegah penyakit. Segera cari bantuan medis jika ada yang terluka. Perhatikan kondisi mental dan stres pasca bencana.",
        icon: "🏥",
    },
];

/// Render one guidance card; `index` drives the staggered reveal delay.
fn entry_html(entry: &GuidanceEntry, index: usize) -> String {
    format!(
        r#"<div class="card mitigasi-card" data-aos="fade-up" data-aos-delay="{delay}">
  <div class="card-header">
    <span class="card-icon">{icon}</span>
    <h4>{title}</h4>
  </div>
  <div class="card-body">
    <p>{description}</p>
  </div>
</div>"#,
        delay = 100 * (index + 1),
        icon = entry.icon,
        title = html_escape(entry.title),
        description = html_escape(entry.description),
    )
}

/// Render one timeline section for a phase.
#[must_use]
pub fn section_html(phase: Phase) -> String {
    let cards: String = phase
        .entries()
        .iter()
        .enumerate()
        .map(|(i, entry)| entry_html(entry, i))
        .collect();

    format!(
        r#"<div class="timeline-item" data-aos="{animation}">
  <div class="timeline-content">
    <h3>{heading}</h3>
    <div class="card-container">{cards}</div>
  </div>
</div>"#,
        animation = phase.animation(),
        heading = phase.heading(),
    )
}

/// Container for the rendered mitigation sections.
#[derive(Debug, Clone, Default)]
pub struct MitigationContainer {
    sections: Vec<String>,
}

impl MitigationContainer {
    #[cfg(test)]
    pub(crate) fn sections(&self) -> &[String] {
        &self.sections
    }

    #[must_use]
    pub fn to_html(&self) -> String {
        self.sections.concat()
    }
}

/// Replace the container's content with the three phase sections.
pub fn render_mitigation_sections(container: &mut MitigationContainer) {
    container.sections = Phase::ALL.into_iter().map(section_html).collect();
}
